// Copyright 2021 The Mimble Developers
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Logging wrapper to be used throughout all crates in the workspace

use crate::types::{LogLevel, LoggingConfig};
use crate::Mutex;

use backtrace::Backtrace;
use std::{panic, thread};

use log::LevelFilter;
use log4rs::append::console::ConsoleAppender;
use log4rs::append::file::FileAppender;
use log4rs::config::{Appender, Config, Root};
use log4rs::encode::pattern::PatternEncoder;
use log4rs::filter::threshold::ThresholdFilter;

lazy_static! {
	/// Flag to observe whether logging was explicitly initialised (don't output otherwise)
	static ref WAS_INIT: Mutex<bool> = Mutex::new(false);
}

const LOGGING_PATTERN: &str = "{d(%Y%m%d %H:%M:%S%.3f)} {h({l})} {M} - {m}{n}";

fn convert_log_level(in_level: &LogLevel) -> LevelFilter {
	match *in_level {
		LogLevel::Error => LevelFilter::Error,
		LogLevel::Warning => LevelFilter::Warn,
		LogLevel::Info => LevelFilter::Info,
		LogLevel::Debug => LevelFilter::Debug,
		LogLevel::Trace => LevelFilter::Trace,
	}
}

/// Initialize the logger with the given configuration. Logs to stdout and/or
/// a file depending on the config; subsequent calls are no-ops.
pub fn init_logger(config: Option<LoggingConfig>) {
	{
		let mut was_init = WAS_INIT.lock();
		if *was_init {
			return;
		}
		*was_init = true;
	}

	let config = config.unwrap_or_default();
	let level_stdout = convert_log_level(&config.stdout_log_level);
	let level_file = convert_log_level(&config.file_log_level);

	// Determine minimum logging level for Root logger
	let level_minimum = if level_stdout > level_file {
		level_stdout
	} else {
		level_file
	};

	let mut root = Root::builder();
	let mut appenders = vec![];

	if config.log_to_stdout {
		let stdout = ConsoleAppender::builder()
			.encoder(Box::new(PatternEncoder::new(LOGGING_PATTERN)))
			.build();
		appenders.push(
			Appender::builder()
				.filter(Box::new(ThresholdFilter::new(level_stdout)))
				.build("stdout", Box::new(stdout)),
		);
		root = root.appender("stdout");
	}

	if config.log_to_file {
		let file = FileAppender::builder()
			.append(config.log_file_append)
			.encoder(Box::new(PatternEncoder::new(LOGGING_PATTERN)))
			.build(&config.log_file_path);
		if let Ok(file) = file {
			appenders.push(
				Appender::builder()
					.filter(Box::new(ThresholdFilter::new(level_file)))
					.build("file", Box::new(file)),
			);
			root = root.appender("file");
		}
	}

	let log_config = Config::builder()
		.appenders(appenders)
		.build(root.build(level_minimum))
		.unwrap();

	let _ = log4rs::init_config(log_config);

	info!(
		"log4rs is initialized, file level: {:?}, stdout level: {:?}, min. level: {:?}",
		level_file, level_stdout, level_minimum
	);

	send_panic_to_log();
}

/// Initializes the logger for unit and integration tests
pub fn init_test_logger() {
	let mut config = LoggingConfig::default();
	config.log_to_file = false;
	config.stdout_log_level = LogLevel::Debug;
	init_logger(Some(config));
}

/// hook to send panics to logs as well as stderr
fn send_panic_to_log() {
	panic::set_hook(Box::new(|info| {
		let backtrace = Backtrace::new();

		let thread = thread::current();
		let thread = thread.name().unwrap_or("unnamed");

		let msg = match info.payload().downcast_ref::<&'static str>() {
			Some(s) => *s,
			None => match info.payload().downcast_ref::<String>() {
				Some(s) => &**s,
				None => "Box<Any>",
			},
		};

		match info.location() {
			Some(location) => {
				error!(
					"\nthread '{}' panicked at '{}': {}:{}{:?}\n\n",
					thread,
					msg,
					location.file(),
					location.line(),
					backtrace
				);
			}
			None => error!("thread '{}' panicked at '{}'{:?}", thread, msg, backtrace),
		}
	}));
}
