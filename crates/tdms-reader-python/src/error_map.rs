use pyo3::{
    PyErr, Python,
    exceptions::{PyFileNotFoundError, PyKeyError, PyOSError},
    types::PyAnyMethods,
};
use tdms_reader_core::TdmsError;

use crate::exceptions::{CorruptFileError, ExportError, TruncatedFileError};

pub(crate) fn tdms_error_to_py(py: Python<'_>, err: TdmsError) -> PyErr {
    let msg = err.to_string();

    match err {
        TdmsError::NoSuchGroup { group } => {
            let py_err = PyKeyError::new_err(msg);
            if let Err(e) = py_err.value(py).setattr("group", group) {
                return e;
            }
            py_err
        }

        TdmsError::NoSuchChannel { group, channel } => {
            let py_err = PyKeyError::new_err(msg);
            let exc = py_err.value(py);
            if let Err(e) = exc.setattr("group", group) {
                return e;
            }
            if let Err(e) = exc.setattr("channel", channel) {
                return e;
            }
            py_err
        }

        TdmsError::TruncatedFile {
            offset,
            required,
            available,
        } => {
            let py_err = TruncatedFileError::new_err(msg);
            let exc = py_err.value(py);
            if let Err(e) = exc.setattr("offset", offset) {
                return e;
            }
            if let Err(e) = exc.setattr("required", required) {
                return e;
            }
            if let Err(e) = exc.setattr("available", available) {
                return e;
            }
            py_err
        }

        TdmsError::CorruptHeader { .. }
        | TdmsError::CorruptMetadata { .. }
        | TdmsError::CorruptData { .. }
        | TdmsError::UnknownDataType { .. }
        | TdmsError::InconsistentChannelType { .. } => CorruptFileError::new_err(msg),

        TdmsError::Io { source, .. } if source.kind() == std::io::ErrorKind::NotFound => {
            PyFileNotFoundError::new_err(msg)
        }
        TdmsError::Io { .. } => PyOSError::new_err(msg),

        TdmsError::UnsupportedExportType { .. }
        | TdmsError::TimestampOutOfRange { .. }
        | TdmsError::Arrow { .. } => ExportError::new_err(msg),
    }
}
