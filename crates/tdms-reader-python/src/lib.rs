//! Python bindings for tdms-reader.
mod error_map;
mod exceptions;

#[pyo3::pymodule(name = "tdms_reader")]
mod tdms_reader {
    use std::path::PathBuf;

    use arrow::ffi::{FFI_ArrowArray, FFI_ArrowSchema};
    use pyo3::{
        Bound, PyResult,
        exceptions::PyValueError,
        prelude::*,
        pyclass, pymethods,
        types::{PyComplex, PyDict, PyModule},
    };
    use tdms_reader_core::{OpenOptions, Properties, PropertyValue, SourceKind, TdmsFile};

    use crate::{
        error_map::tdms_error_to_py,
        exceptions::{CorruptFileError, ExportError, TdmsReaderError, TruncatedFileError},
    };

    /// An open TDMS file. The metadata index is built when the file is opened.
    #[pyclass(name = "TdmsFile", frozen)]
    struct PyTdmsFile {
        path: PathBuf,
        inner: TdmsFile,
    }

    #[pymethods]
    impl PyTdmsFile {
        #[new]
        #[pyo3(signature = (path, *, recover_truncated = false, memory_map = false))]
        fn new(
            py: Python<'_>,
            path: PathBuf,
            recover_truncated: bool,
            memory_map: bool,
        ) -> PyResult<Self> {
            let source = if memory_map {
                SourceKind::Mmap
            } else {
                SourceKind::Buffered
            };
            let inner = OpenOptions::new()
                .recover_truncated(recover_truncated)
                .source(source)
                .open(&path)
                .map_err(|e| tdms_error_to_py(py, e))?;
            Ok(Self { path, inner })
        }

        /// Group names in file order.
        fn groups(&self) -> Vec<String> {
            self.inner.groups().into_iter().map(str::to_owned).collect()
        }

        /// Channel names of `group` in file order. Raises `KeyError` for an
        /// unknown group.
        fn group_channels(&self, py: Python<'_>, group: &str) -> PyResult<Vec<String>> {
            let channels = self
                .inner
                .group_channels(group)
                .map_err(|e| tdms_error_to_py(py, e))?;
            Ok(channels.into_iter().map(str::to_owned).collect())
        }

        /// File-level properties as a dict.
        fn properties<'py>(&self, py: Python<'py>) -> PyResult<Bound<'py, PyDict>> {
            properties_to_dict(py, self.inner.properties())
        }

        fn group_properties<'py>(
            &self,
            py: Python<'py>,
            group: &str,
        ) -> PyResult<Bound<'py, PyDict>> {
            let props = self
                .inner
                .group_properties(group)
                .map_err(|e| tdms_error_to_py(py, e))?;
            properties_to_dict(py, props)
        }

        fn channel_properties<'py>(
            &self,
            py: Python<'py>,
            group: &str,
            channel: &str,
        ) -> PyResult<Bound<'py, PyDict>> {
            let props = self
                .inner
                .channel_properties(group, channel)
                .map_err(|e| tdms_error_to_py(py, e))?;
            properties_to_dict(py, props)
        }

        /// Number of samples in a channel, without reading them.
        fn channel_length(&self, py: Python<'_>, group: &str, channel: &str) -> PyResult<u64> {
            let entry = self
                .inner
                .channel(group, channel)
                .map_err(|e| tdms_error_to_py(py, e))?;
            Ok(entry.sample_count())
        }

        /// Read a channel and write it into caller-allocated `ArrowSchema` and
        /// `ArrowArray` structs, given as integer addresses (as produced by
        /// `pyarrow.cffi`). The caller owns both structs afterwards and must
        /// release them, typically via `pyarrow.Array._import_from_c`.
        fn channel_data(
            &self,
            py: Python<'_>,
            group: &str,
            channel: &str,
            schema_ptr: usize,
            array_ptr: usize,
        ) -> PyResult<()> {
            if schema_ptr == 0 || array_ptr == 0 {
                return Err(PyValueError::new_err(
                    "schema_ptr and array_ptr must be non-null addresses",
                ));
            }
            let exported = self
                .inner
                .channel_data(group, channel)
                .map_err(|e| tdms_error_to_py(py, e))?;
            // SAFETY: the caller hands us the addresses of writable, properly
            // aligned ArrowSchema/ArrowArray structs it owns.
            unsafe {
                exported.write_to(
                    schema_ptr as *mut FFI_ArrowSchema,
                    array_ptr as *mut FFI_ArrowArray,
                )
            };
            Ok(())
        }

        /// Read a channel as a `pyarrow.Array`. Requires pyarrow.
        fn read_channel<'py>(
            &self,
            py: Python<'py>,
            group: &str,
            channel: &str,
        ) -> PyResult<Bound<'py, PyAny>> {
            let exported = self
                .inner
                .channel_data(group, channel)
                .map_err(|e| tdms_error_to_py(py, e))?;
            let (schema, array) = exported.into_raw_parts();
            let mut schema = Box::new(schema);
            let mut array = Box::new(array);
            let schema_ptr = &mut *schema as *mut FFI_ArrowSchema as usize;
            let array_ptr = &mut *array as *mut FFI_ArrowArray as usize;

            // pyarrow moves out of both structs and marks them released; if the
            // import fails, dropping the boxes releases them instead.
            py.import("pyarrow")?
                .getattr("Array")?
                .call_method1("_import_from_c", (array_ptr, schema_ptr))
        }

        #[getter]
        fn is_truncated(&self) -> bool {
            self.inner.is_truncated()
        }

        fn __repr__(&self) -> String {
            format!(
                "TdmsFile(path={:?}, groups={})",
                self.path.display().to_string(),
                self.inner.groups().len()
            )
        }
    }

    fn properties_to_dict<'py>(
        py: Python<'py>,
        properties: &Properties,
    ) -> PyResult<Bound<'py, PyDict>> {
        let dict = PyDict::new(py);
        for (name, value) in properties {
            match value {
                PropertyValue::I8(v) => dict.set_item(name, v)?,
                PropertyValue::I16(v) => dict.set_item(name, v)?,
                PropertyValue::I32(v) => dict.set_item(name, v)?,
                PropertyValue::I64(v) => dict.set_item(name, v)?,
                PropertyValue::U8(v) => dict.set_item(name, v)?,
                PropertyValue::U16(v) => dict.set_item(name, v)?,
                PropertyValue::U32(v) => dict.set_item(name, v)?,
                PropertyValue::U64(v) => dict.set_item(name, v)?,
                PropertyValue::F32(v) => dict.set_item(name, f64::from(*v))?,
                PropertyValue::F64(v) => dict.set_item(name, v)?,
                PropertyValue::String(v) => dict.set_item(name, v)?,
                PropertyValue::Boolean(v) => dict.set_item(name, v)?,
                PropertyValue::Timestamp(ts) => dict.set_item(name, ts.to_string())?,
                PropertyValue::ComplexF32([re, im]) => dict.set_item(
                    name,
                    PyComplex::from_doubles(py, f64::from(*re), f64::from(*im)),
                )?,
                PropertyValue::ComplexF64([re, im]) => {
                    dict.set_item(name, PyComplex::from_doubles(py, *re, *im))?
                }
            }
        }
        Ok(dict)
    }

    #[pymodule_init]
    fn init(m: &Bound<'_, PyModule>) -> PyResult<()> {
        let py = m.py();
        m.add("__version__", env!("CARGO_PKG_VERSION"))?;
        m.add("TdmsReaderError", py.get_type::<TdmsReaderError>())?;
        m.add("CorruptFileError", py.get_type::<CorruptFileError>())?;
        m.add("TruncatedFileError", py.get_type::<TruncatedFileError>())?;
        m.add("ExportError", py.get_type::<ExportError>())?;
        Ok(())
    }
}
