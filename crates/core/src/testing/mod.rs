//! Testing utilities: a recording observer and converter fixtures.
//!
//! # Example
//!
//! ```rust,ignore
//! use bfbatch_core::testing::{shell_converter, RecordingObserver};
//!
//! // A "converter" that writes its output file and succeeds.
//! let converter = shell_converter(r#"touch "$2""#);
//! let observer = Arc::new(RecordingObserver::new());
//! let driver = ConversionDriver::new(converter, scheduler).with_observer(observer.clone());
//! ```

mod recording_observer;

pub use recording_observer::{ObservedEvent, RecordingObserver};

use crate::driver::ConverterConfig;
use crate::job::{INPUT_PLACEHOLDER, OUTPUT_PLACEHOLDER};

/// Converter config running `script` through `/bin/sh`.
///
/// Inside the script `$1` is the input path and `$2` the output path.
pub fn shell_converter(script: &str) -> ConverterConfig {
    ConverterConfig::with_tool("/bin", "sh").with_args([
        "-c",
        script,
        "bfbatch-test",
        INPUT_PLACEHOLDER,
        OUTPUT_PLACEHOLDER,
    ])
}

/// Script behaving like a well-formed converter: writes the output and exits 0.
pub const CONVERT_OK: &str = r#"printf 'converted %s\n' "$1" > "$2""#;

/// Script that leaves an empty output behind and reports failure.
pub const CONVERT_FAIL: &str = r#": > "$2"; echo "Unknown file format: $1" >&2; exit 1"#;

/// Script dispatching on the input file name: inputs containing `fail`
/// fail with exit 1 (leaving a stray output), inputs containing `missing`
/// exit 127, everything else converts after a short delay.
pub const CONVERT_BY_NAME: &str = r#"
case "$1" in
  *fail*) : > "$2"; echo "cannot read $1" >&2; exit 1 ;;
  *missing*) exit 127 ;;
  *) sleep 0.05; printf ok > "$2" ;;
esac
"#;
