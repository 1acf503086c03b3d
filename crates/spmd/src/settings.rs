//! Pass settings.
//!
//! Settings are configured through a [`Builder`], which is consumed to produce an immutable
//! [`Flags`] object shared by the passes of a pipeline.
//!
//! ```
//! use hlo_spmd::settings::{self, Configurable};
//!
//! let mut b = settings::builder();
//! b.set("enable_verifier", "false").unwrap();
//! b.enable("dump_ir").unwrap();
//!
//! let f = settings::Flags::new(b);
//! assert!(!f.enable_verifier());
//! assert!(f.dump_ir());
//! ```

use core::fmt;
use thiserror::Error;

/// A string-based configurator for settings groups.
///
/// The `Configurable` protocol allows settings to be modified by name before a finished `Flags`
/// struct is created.
pub trait Configurable {
    /// Set the string value of any setting by name.
    ///
    /// This can set any type of setting whether it is numeric, boolean, or enumerated.
    fn set(&mut self, name: &str, value: &str) -> SetResult<()>;

    /// Enable a boolean setting or apply a preset.
    ///
    /// If the identified setting isn't a boolean or a preset, a `BadType` error is returned.
    fn enable(&mut self, name: &str) -> SetResult<()>;
}

/// An error produced when changing a setting.
#[derive(Error, Debug, PartialEq, Eq)]
pub enum SetError {
    /// No setting by this name exists.
    #[error("No existing setting named '{0}'")]
    BadName(String),

    /// Type mismatch for setting (e.g., setting enum with bool).
    #[error("Trying to set a setting with the wrong type")]
    BadType,

    /// This is not a valid value for this setting.
    #[error("Unexpected value for a setting, expected {0}")]
    BadValue(String),
}

/// A result returned when changing a setting.
pub type SetResult<T> = Result<T, SetError>;

fn parse_bool_value(value: &str) -> SetResult<bool> {
    match value {
        "true" | "on" | "yes" | "1" => Ok(true),
        "false" | "off" | "no" | "0" => Ok(false),
        _ => Err(SetError::BadValue("bool".to_string())),
    }
}

/// Collect settings before creating a `Flags` object.
#[derive(Clone, Debug)]
pub struct Builder {
    enable_verifier: bool,
    dump_ir: bool,
}

/// Create a `Builder` with every setting at its default value.
pub fn builder() -> Builder {
    Builder {
        enable_verifier: true,
        dump_ir: false,
    }
}

impl Builder {
    fn flag(&mut self, name: &str) -> SetResult<&mut bool> {
        match name {
            "enable_verifier" => Ok(&mut self.enable_verifier),
            "dump_ir" => Ok(&mut self.dump_ir),
            _ => Err(SetError::BadName(name.to_string())),
        }
    }
}

impl Configurable for Builder {
    fn set(&mut self, name: &str, value: &str) -> SetResult<()> {
        let flag = self.flag(name)?;
        *flag = parse_bool_value(value)?;
        Ok(())
    }

    fn enable(&mut self, name: &str) -> SetResult<()> {
        *self.flag(name)? = true;
        Ok(())
    }
}

/// Flags shared by the passes of a pipeline.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct Flags {
    enable_verifier: bool,
    dump_ir: bool,
}

impl Flags {
    /// Create flags from a finished builder.
    pub fn new(builder: Builder) -> Self {
        Self {
            enable_verifier: builder.enable_verifier,
            dump_ir: builder.dump_ir,
        }
    }

    /// Run the IR verifier on the module before the first pass and after every pass that
    /// changed it.
    ///
    /// This makes pipelines slower but catches many bugs.
    pub fn enable_verifier(&self) -> bool {
        self.enable_verifier
    }

    /// Log the module text before and after every pass, at the debug level.
    pub fn dump_ir(&self) -> bool {
        self.dump_ir
    }
}

impl Default for Flags {
    fn default() -> Self {
        Self::new(builder())
    }
}

impl fmt::Display for Flags {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        writeln!(f, "[shared]")?;
        writeln!(f, "enable_verifier = {}", self.enable_verifier)?;
        writeln!(f, "dump_ir = {}", self.dump_ir)
    }
}
