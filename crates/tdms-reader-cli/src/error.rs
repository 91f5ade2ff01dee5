use arrow::error::ArrowError;
use snafu::Snafu;
use tdms_reader_core::TdmsError;

pub type CliResult<T> = std::result::Result<T, CliError>;

#[derive(Debug, Snafu)]
#[snafu(visibility(pub(crate)))]
pub enum CliError {
    #[snafu(display("Failed to open TDMS file {path}: {source}"))]
    OpenFile {
        path: String,
        #[snafu(source(from(TdmsError, Box::new)))]
        source: Box<TdmsError>,
    },

    #[snafu(display("Failed to list group '{group}': {source}"))]
    ListGroup {
        group: String,
        #[snafu(source(from(TdmsError, Box::new)))]
        source: Box<TdmsError>,
    },

    #[snafu(display("Failed to read channel '{group}/{channel}': {source}"))]
    ReadChannel {
        group: String,
        channel: String,
        #[snafu(source(from(TdmsError, Box::new)))]
        source: Box<TdmsError>,
    },

    #[snafu(display("Failed to format channel '{group}/{channel}': {source}"))]
    FormatChannel {
        group: String,
        channel: String,
        source: ArrowError,
    },

    #[snafu(display("Failed to serialize listing as JSON: {source}"))]
    SerializeJson { source: serde_json::Error },
}
