pub mod youtube;

pub use youtube::YouTubeSource;
