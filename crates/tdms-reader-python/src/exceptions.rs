//! Python exception types exposed by the `tdms_reader` module.

use pyo3::{create_exception, exceptions::PyException};

create_exception!(
    tdms_reader,
    TdmsReaderError,
    PyException,
    "Base exception for tdms_reader."
);

create_exception!(
    tdms_reader,
    CorruptFileError,
    TdmsReaderError,
    "Raised when a segment header, metadata block or raw data cannot be decoded."
);

create_exception!(
    tdms_reader,
    TruncatedFileError,
    CorruptFileError,
    "Raised when a segment extends past the end of the file."
);

create_exception!(
    tdms_reader,
    ExportError,
    TdmsReaderError,
    "Raised when a channel cannot be exported through the Arrow C Data Interface."
);
