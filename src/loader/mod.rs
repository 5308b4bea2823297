pub mod sample_loader;

pub use sample_loader::{index_wav_in_dir, load};
