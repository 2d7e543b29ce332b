//! Function registration table and dispatch
//!
//! A module's manifest is read exactly once, at load time, into a
//! [`Registry`]; every later invocation goes through [`Registry::call`],
//! which enforces the declared arity and parameter types before jumping into
//! native code.

use std::collections::HashMap;
use std::ffi::{CStr, CString};

use pgtrack_abi::{Datum, FunctionCallInfo, FunctionEntry, FunctionFlags, ModuleManifest, ValueType};

use crate::error::{Result, TrackError};

/// A scalar crossing to or from a module function.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Text(String),
    Int32(i32),
    Int64(i64),
    Float64(f64),
    Bool(bool),
}

impl Value {
    pub fn value_type(&self) -> ValueType {
        match self {
            Value::Text(_) => ValueType::Text,
            Value::Int32(_) => ValueType::Int32,
            Value::Int64(_) => ValueType::Int64,
            Value::Float64(_) => ValueType::Float64,
            Value::Bool(_) => ValueType::Bool,
        }
    }
}

impl std::fmt::Display for Value {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Value::Text(v) => f.write_str(v),
            Value::Int32(v) => write!(f, "{v}"),
            Value::Int64(v) => write!(f, "{v}"),
            Value::Float64(v) => write!(f, "{v}"),
            Value::Bool(v) => write!(f, "{v}"),
        }
    }
}

/// Metadata for one function, as declared by the module.
#[derive(Debug)]
pub struct RegisteredFunction {
    name: String,
    arg_types: Vec<ValueType>,
    return_type: ValueType,
    flags: FunctionFlags,
    entry: FunctionEntry,
}

impl RegisteredFunction {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn arg_types(&self) -> &[ValueType] {
        &self.arg_types
    }

    pub fn return_type(&self) -> ValueType {
        self.return_type
    }

    pub fn flags(&self) -> FunctionFlags {
        self.flags
    }
}

/// Registration table built once from a module manifest.
#[derive(Debug)]
pub struct Registry {
    module_name: String,
    functions: HashMap<String, RegisteredFunction>,
    order: Vec<String>,
}

impl Registry {
    /// Reads a module's registration table.
    ///
    /// The manifest must describe `'static` module data: names stay
    /// NUL-terminated, arrays match their declared counts, and entry pointers
    /// stay callable for as long as the registry is used.
    pub fn from_manifest(manifest: &ModuleManifest) -> Result<Self> {
        if manifest.name.is_null() {
            return Err(TrackError::BadManifest("module name is null"));
        }
        let module_name = unsafe { CStr::from_ptr(manifest.name) }
            .to_string_lossy()
            .into_owned();
        if manifest.function_count > 0 && manifest.functions.is_null() {
            return Err(TrackError::BadManifest("function table is null"));
        }
        let infos = if manifest.function_count == 0 {
            &[][..]
        } else {
            unsafe { std::slice::from_raw_parts(manifest.functions, manifest.function_count) }
        };

        let mut functions = HashMap::new();
        let mut order = Vec::new();
        for info in infos {
            if info.name.is_null() {
                return Err(TrackError::BadManifest("function name is null"));
            }
            let name = unsafe { CStr::from_ptr(info.name) }
                .to_string_lossy()
                .into_owned();
            let nargs = info.nargs as usize;
            if nargs > 0 && info.arg_types.is_null() {
                return Err(TrackError::BadManifest("argument type table is null"));
            }
            let arg_types = if nargs == 0 {
                Vec::new()
            } else {
                unsafe { std::slice::from_raw_parts(info.arg_types, nargs) }.to_vec()
            };
            let function = RegisteredFunction {
                name: name.clone(),
                arg_types,
                return_type: info.return_type,
                flags: FunctionFlags::from_bits_truncate(info.flags),
                entry: info.entry,
            };
            if functions.insert(name.clone(), function).is_some() {
                return Err(TrackError::DuplicateFunction(name));
            }
            order.push(name);
        }
        log::debug!("module '{module_name}': {} function(s) registered", order.len());
        Ok(Self {
            module_name,
            functions,
            order,
        })
    }

    pub fn module_name(&self) -> &str {
        &self.module_name
    }

    pub fn function(&self, name: &str) -> Option<&RegisteredFunction> {
        self.functions.get(name)
    }

    /// Registered functions, in manifest order.
    pub fn functions(&self) -> impl Iterator<Item = &RegisteredFunction> {
        self.order.iter().map(|name| &self.functions[name])
    }

    /// Dispatches a call through the registration table.
    pub fn call(&self, name: &str, args: &[Value]) -> Result<Value> {
        let function = self
            .functions
            .get(name)
            .ok_or_else(|| TrackError::UnknownFunction(name.to_string()))?;
        if args.len() != function.arg_types.len() {
            return Err(TrackError::ArityMismatch(
                name.to_string(),
                function.arg_types.len(),
                args.len(),
            ));
        }
        for (index, (arg, &expected)) in args.iter().zip(&function.arg_types).enumerate() {
            if arg.value_type() != expected {
                return Err(TrackError::ArgumentTypeMismatch(
                    name.to_string(),
                    index,
                    expected,
                ));
            }
        }

        // Text arguments must outlive the native call.
        let mut texts: Vec<CString> = Vec::new();
        let mut datums: Vec<Datum> = Vec::with_capacity(args.len());
        for arg in args {
            datums.push(match arg {
                Value::Text(v) => {
                    let text = CString::new(v.as_str())?;
                    let datum = Datum::text(text.as_ptr());
                    texts.push(text);
                    datum
                }
                Value::Int32(v) => Datum::int32(*v),
                Value::Int64(v) => Datum::int64(*v),
                Value::Float64(v) => Datum::float64(*v),
                Value::Bool(v) => Datum::boolean(*v),
            });
        }
        let fcinfo = FunctionCallInfo {
            nargs: datums.len() as u16,
            args: if datums.is_empty() {
                std::ptr::null()
            } else {
                datums.as_ptr()
            },
        };
        let datum = unsafe { (function.entry)(&fcinfo) };
        decode(function, datum)
    }
}

fn decode(function: &RegisteredFunction, datum: Datum) -> Result<Value> {
    if datum.vtype != function.return_type {
        return Err(TrackError::ReturnTypeMismatch(
            function.name.clone(),
            function.return_type,
            datum.vtype,
        ));
    }
    let value = match datum.vtype {
        ValueType::Text => {
            let ptr = unsafe { datum.payload.text };
            if ptr.is_null() {
                return Err(TrackError::NullDatum(function.name.clone()));
            }
            Value::Text(unsafe { CStr::from_ptr(ptr) }.to_string_lossy().into_owned())
        }
        ValueType::Int32 => Value::Int32(unsafe { datum.payload.int32 }),
        ValueType::Int64 => Value::Int64(unsafe { datum.payload.int64 }),
        ValueType::Float64 => Value::Float64(unsafe { datum.payload.float64 }),
        ValueType::Bool => Value::Bool(unsafe { datum.payload.boolean }),
    };
    Ok(value)
}
