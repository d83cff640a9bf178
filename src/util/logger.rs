// Pruned copy of crate rust log, without global logger
// https://github.com/rust-lang-nursery/log #7a60286
//
// This file is licensed under the Apache License, Version 2.0 <LICENSE-APACHE
// or http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your option.
// You may not use this file except in accordance with one or both of these
// licenses.

//! Log traits live here, which are called throughout the library to provide useful information for
//! debugging purposes.
//!
//! Log messages should be filtered client-side by implementing check against a given [`Record`]'s
//! [`Level`] field. Each module may have its own Logger or share one.

use bitcoin::secp256k1::PublicKey;

use core::cmp;
use core::fmt;
use core::fmt::Display;
use core::fmt::Write;
use core::ops::Deref;

static LOG_LEVEL_NAMES: [&'static str; 6] = ["GOSSIP", "TRACE", "DEBUG", "INFO", "WARN", "ERROR"];

/// An enum representing the available verbosity levels of the logger.
#[derive(Copy, Clone, PartialEq, Eq, Debug, Hash)]
pub enum Level {
	/// Designates extremely verbose information, such as full signature hash preimages
	Gossip,
	/// Designates very low priority, often extremely verbose, information
	Trace,
	/// Designates lower priority information
	Debug,
	/// Designates useful information
	Info,
	/// Designates hazardous situations
	Warn,
	/// Designates very serious errors
	Error,
}

impl PartialOrd for Level {
	#[inline]
	fn partial_cmp(&self, other: &Level) -> Option<cmp::Ordering> {
		Some(self.cmp(other))
	}
}

impl Ord for Level {
	#[inline]
	fn cmp(&self, other: &Level) -> cmp::Ordering {
		(*self as usize).cmp(&(*other as usize))
	}
}

impl fmt::Display for Level {
	fn fmt(&self, fmt: &mut fmt::Formatter) -> fmt::Result {
		fmt.pad(LOG_LEVEL_NAMES[*self as usize])
	}
}

impl Level {
	/// Returns the most verbose logging level.
	#[inline]
	pub fn max() -> Level {
		Level::Gossip
	}
}

/// A Record, unit of logging output with Metadata to enable filtering
/// Module_path, file, line to inform on log's source
#[derive(Clone, Debug)]
pub struct Record<'a> {
	/// The verbosity level of the message.
	pub level: Level,
	/// The RPC operation pertaining to the logged record, if any. Since the operation is not
	/// repeated in the message body, include it in the log output so entries remain clear.
	pub method: Option<&'static str>,
	/// The message body.
	pub args: fmt::Arguments<'a>,
	/// The module path of the message.
	pub module_path: &'static str,
	/// The source file containing the message.
	pub file: &'static str,
	/// The line containing the message.
	pub line: u32,
}

impl<'a> Record<'a> {
	/// Returns a new Record.
	#[inline]
	pub fn new(
		level: Level, method: Option<&'static str>, args: fmt::Arguments<'a>,
		module_path: &'static str, file: &'static str, line: u32,
	) -> Record<'a> {
		Record { level, method, args, module_path, file, line }
	}
}

impl<'a> Display for Record<'a> {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		let mut context_formatter = SubstringFormatter::new(48, f);
		write!(&mut context_formatter, "{:<5} [{}:{}]", self.level, self.module_path, self.line)?;
		context_formatter.pad_remaining()?;

		let mut method_formatter = SubstringFormatter::new(24, f);
		if let Some(method) = self.method {
			write!(method_formatter, " rpc:{}", method)?;
		}
		method_formatter.pad_remaining()?;

		write!(f, " {}", self.args)
	}
}

// Writes only up to a certain number of unicode characters to the underlying formatter. This handles multi-byte Unicode
// characters safely.
struct SubstringFormatter<'fmt: 'r, 'r> {
	remaining_chars: usize,
	fmt: &'r mut fmt::Formatter<'fmt>,
}

impl<'fmt: 'r, 'r> SubstringFormatter<'fmt, 'r> {
	fn new(length: usize, formatter: &'r mut fmt::Formatter<'fmt>) -> Self {
		debug_assert!(length <= 100);
		SubstringFormatter { remaining_chars: length, fmt: formatter }
	}

	// Pads the underlying formatter with spaces until the remaining character count.
	fn pad_remaining(&mut self) -> fmt::Result {
		// Use a constant string to avoid allocations.
		const PAD100: &str = "                                                                                                    "; // 100 spaces

		self.fmt.write_str(&PAD100[..self.remaining_chars])?;
		self.remaining_chars = 0;

		Ok(())
	}
}

impl<'fmt: 'r, 'r> Write for SubstringFormatter<'fmt, 'r> {
	fn write_str(&mut self, s: &str) -> fmt::Result {
		let mut char_count = 0;
		let mut next_char_byte_pos = 0;

		// Iterate over the unicode character boundaries in `s`. We take one more than the number of remaining
		// characters so we can find the byte boundary where we should stop writing.
		for (pos, _) in s.char_indices().take(self.remaining_chars + 1) {
			char_count += 1;
			next_char_byte_pos = pos;
		}

		// Determine where to split the string.
		let at_cut_off_point = char_count == self.remaining_chars + 1;
		let split_pos = if at_cut_off_point {
			self.remaining_chars = 0;
			next_char_byte_pos
		} else {
			// Not enough characters in this chunk.
			self.remaining_chars -= char_count;
			s.len()
		};

		// Write only the substring up to the split position into the formatter.
		self.fmt.write_str(&s[..split_pos])
	}
}

/// A trait encapsulating the operations required of a logger. Keep in mind that log messages might
/// not be entirely self-explanatory and may need accompanying context fields to be fully
/// understood.
pub trait Logger {
	/// Logs the [`Record`]. Since [`Record::method`] is not embedded in the message body, log
	/// implementations should print it alongside the message to keep entries clear.
	fn log(&self, record: Record);
}

/// Adds the RPC operation to a [`Record`] before passing it to the wrapped [`Logger`].
pub struct WithContext<'a, L: Deref>
where
	L::Target: Logger,
{
	/// The logger to delegate to after adding context to the record.
	logger: &'a L,
	/// The RPC operation pertaining to the logged record.
	method: Option<&'static str>,
}

impl<'a, L: Deref> Logger for WithContext<'a, L>
where
	L::Target: Logger,
{
	fn log(&self, mut record: Record) {
		if self.method.is_some() {
			record.method = self.method;
		}
		self.logger.log(record)
	}
}

impl<'a, L: Deref> WithContext<'a, L>
where
	L::Target: Logger,
{
	/// Wraps the given logger, providing additional context to any logged records.
	pub fn from(logger: &'a L, method: Option<&'static str>) -> Self {
		WithContext { logger, method }
	}
}

/// Wrapper for logging a [`PublicKey`] in hex format.
#[doc(hidden)]
pub struct DebugPubKey<'a>(pub &'a PublicKey);
impl<'a> core::fmt::Display for DebugPubKey<'a> {
	fn fmt(&self, f: &mut core::fmt::Formatter) -> Result<(), core::fmt::Error> {
		for i in self.0.serialize().iter() {
			write!(f, "{:02x}", i)?;
		}
		Ok(())
	}
}

/// Wrapper for logging byte slices in hex format.
#[doc(hidden)]
pub struct DebugBytes<'a>(pub &'a [u8]);
impl<'a> core::fmt::Display for DebugBytes<'a> {
	fn fmt(&self, f: &mut core::fmt::Formatter) -> Result<(), core::fmt::Error> {
		for i in self.0 {
			write!(f, "{:02x}", i)?;
		}
		Ok(())
	}
}

#[cfg(test)]
mod tests {
	use crate::util::logger::{Level, Logger, WithContext};
	use crate::util::test_utils::TestLogger;
	use std::sync::Arc;

	#[test]
	fn test_level_show() {
		assert_eq!("INFO", Level::Info.to_string());
		assert_eq!("ERROR", Level::Error.to_string());
		assert_ne!("WARN", Level::Error.to_string());
	}

	struct WrapperLog {
		logger: Arc<dyn Logger>,
	}

	impl WrapperLog {
		fn new(logger: Arc<dyn Logger>) -> WrapperLog {
			WrapperLog { logger }
		}

		fn call_macros(&self) {
			log_error!(self.logger, "This is an error");
			log_warn!(self.logger, "This is a warning");
			log_info!(self.logger, "This is an info");
			log_debug!(self.logger, "This is a debug");
			log_trace!(self.logger, "This is a trace");
			log_gossip!(self.logger, "This is a gossip");
		}
	}

	#[test]
	fn test_logging_macros() {
		let logger = TestLogger::new();
		let logger: Arc<dyn Logger> = Arc::new(logger);
		let wrapper = WrapperLog::new(Arc::clone(&logger));
		wrapper.call_macros();
	}

	#[test]
	fn test_logging_with_context() {
		let logger = &TestLogger::new();
		let context_logger = WithContext::from(&logger, Some("SignOutputRaw"));
		log_error!(context_logger, "This is an error");
		log_warn!(context_logger, "This is an error");
		log_debug!(context_logger, "This is an error");
		log_trace!(context_logger, "This is an error");
		log_gossip!(context_logger, "This is an error");
		log_info!(context_logger, "This is an error");
		logger.assert_log_method_contains(
			"lightning_remote_signer::util::logger::tests",
			"SignOutputRaw",
			6,
		);
	}

	#[test]
	fn test_outermost_context_wins() {
		let logger = &TestLogger::new();
		let outer = &WithContext::from(&logger, Some("SendOutputs"));
		let inner = WithContext::from(&outer, Some("PublishTransaction"));
		log_info!(inner, "Broadcasting");
		logger.assert_log_method_contains(
			"lightning_remote_signer::util::logger::tests",
			"SendOutputs",
			1,
		);
	}

	#[test]
	fn test_log_ordering() {
		assert!(Level::Error > Level::Warn);
		assert!(Level::Error >= Level::Warn);
		assert!(Level::Error >= Level::Error);
		assert!(Level::Warn > Level::Info);
		assert!(Level::Warn >= Level::Info);
		assert!(Level::Info > Level::Debug);
		assert!(Level::Debug > Level::Trace);
		assert!(Level::Trace > Level::Gossip);
		assert!(Level::Trace >= Level::Trace);
		assert!(Level::Gossip >= Level::Gossip);

		assert!(Level::Warn < Level::Error);
		assert!(Level::Info < Level::Warn);
		assert!(Level::Debug < Level::Info);
		assert!(Level::Trace < Level::Debug);
		assert!(Level::Gossip < Level::Trace);
		assert_eq!(Level::max(), Level::Gossip);
	}
}
