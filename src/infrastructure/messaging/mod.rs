pub mod upload_reaper;

pub use upload_reaper::UploadReaper;
