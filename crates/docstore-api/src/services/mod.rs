pub mod transfer;
pub mod validation;

pub use transfer::{DownloadPayload, TransferService, UploadOutcome};
pub use validation::ValidationService;
