//! Concrete content and manga providers.

pub mod enime;
pub mod mangakakalot;

pub use enime::Enime;
pub use mangakakalot::MangaKakalot;
