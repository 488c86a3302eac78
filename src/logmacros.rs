// -----------------------------------------------------------------------------------------------
// Coaly - context aware logging and tracing system
//
// Copyright (c) 2022, Frank Sommer.
// All rights reserved.
//
// Redistribution and use in source and binary forms, with or without
// modification, are permitted provided that the following conditions are met:
//
// * Redistributions of source code must retain the above copyright notice, this
//   list of conditions and the following disclaimer.
//
// * Redistributions in binary form must reproduce the above copyright notice,
//   this list of conditions and the following disclaimer in the documentation
//   and/or other materials provided with the distribution.
//
// * Neither the name of the copyright holder nor the names of its
//   contributors may be used to endorse or promote products derived from
//   this software without specific prior written permission.
//
// THIS SOFTWARE IS PROVIDED BY THE COPYRIGHT HOLDERS AND CONTRIBUTORS "AS IS"
// AND ANY EXPRESS OR IMPLIED WARRANTIES, INCLUDING, BUT NOT LIMITED TO, THE
// IMPLIED WARRANTIES OF MERCHANTABILITY AND FITNESS FOR A PARTICULAR PURPOSE ARE
// DISCLAIMED. IN NO EVENT SHALL THE COPYRIGHT HOLDER OR CONTRIBUTORS BE LIABLE
// FOR ANY DIRECT, INDIRECT, INCIDENTAL, SPECIAL, EXEMPLARY, OR CONSEQUENTIAL
// DAMAGES (INCLUDING, BUT NOT LIMITED TO, PROCUREMENT OF SUBSTITUTE GOODS OR
// SERVICES; LOSS OF USE, DATA, OR PROFITS; OR BUSINESS INTERRUPTION) HOWEVER
// CAUSED AND ON ANY THEORY OF LIABILITY, WHETHER IN CONTRACT, STRICT LIABILITY,
// OR TORT (INCLUDING NEGLIGENCE OR OTHERWISE) ARISING IN ANY WAY OUT OF THE USE
// OF THIS SOFTWARE, EVEN IF ADVISED OF THE POSSIBILITY OF SUCH DAMAGE.
// -----------------------------------------------------------------------------------------------

//! Minimal internal diagnostic logging.
//!
//! Every boundary operation and every reclaim logs at the appropriate level.
//! This is deliberately not a full sink/formatter/rollover subsystem; a
//! caller embedding the arbiter in a process with its own logging can
//! install a different sink via `set_sink`.

use std::sync::Mutex;
use chrono::Local;

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord)]
pub enum Level {
    Debug,
    Info,
    Warn,
    Error
}
impl Level {
    fn tag(self) -> &'static str {
        match self {
            Level::Debug => "DEBUG",
            Level::Info => "INFO",
            Level::Warn => "WARN",
            Level::Error => "ERROR"
        }
    }
}

/// Receives formatted log lines from the arbiter.
pub trait LogSink: Send {
    fn log(&self, level: Level, msg: &str);
}

/// Default sink, writes timestamped lines to stderr.
struct StderrSink;
impl LogSink for StderrSink {
    fn log(&self, level: Level, msg: &str) {
        eprintln!("{} [{}] {}", Local::now().format("%Y-%m-%d %H:%M:%S%.3f"), level.tag(), msg);
    }
}

lazy_static::lazy_static! {
    static ref SINK: Mutex<Box<dyn LogSink>> = Mutex::new(Box::new(StderrSink));
}

/// Installs a custom sink, replacing the default stderr writer.
pub fn set_sink(sink: Box<dyn LogSink>) {
    if let Ok(mut guard) = SINK.lock() { *guard = sink; }
}

#[doc(hidden)]
pub fn write_log(level: Level, msg: &str) {
    if let Ok(guard) = SINK.lock() { guard.log(level, msg); }
}

#[macro_export]
macro_rules! arbdebug {
    ($($arg:tt)+) => { $crate::logmacros::write_log($crate::logmacros::Level::Debug,
                                                     &std::fmt::format(format_args!($($arg)+))); }
}

#[macro_export]
macro_rules! arbinfo {
    ($($arg:tt)+) => { $crate::logmacros::write_log($crate::logmacros::Level::Info,
                                                     &std::fmt::format(format_args!($($arg)+))); }
}

#[macro_export]
macro_rules! arbwarn {
    ($($arg:tt)+) => { $crate::logmacros::write_log($crate::logmacros::Level::Warn,
                                                     &std::fmt::format(format_args!($($arg)+))); }
}

#[macro_export]
macro_rules! arberror {
    ($($arg:tt)+) => { $crate::logmacros::write_log($crate::logmacros::Level::Error,
                                                     &std::fmt::format(format_args!($($arg)+))); }
}
