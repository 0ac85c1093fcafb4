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

//! libtx specific errors

use crate::core::transaction;
use util::secp;

/// Lib tx error definition
#[derive(Clone, Debug, PartialEq, thiserror::Error)]
pub enum Error {
	/// Secp related error
	#[error("Secp error {0}")]
	Secp(secp::Error),
	/// Signature related error
	#[error("Signature error {0}")]
	Signature(String),
	/// Range proof related error
	#[error("Range proof error {0}")]
	RangeProof(String),
	/// Underlying transaction related error
	#[error("Transaction error {0}")]
	Transaction(transaction::Error),
}

impl From<secp::Error> for Error {
	fn from(e: secp::Error) -> Error {
		Error::Secp(e)
	}
}

impl From<transaction::Error> for Error {
	fn from(e: transaction::Error) -> Error {
		Error::Transaction(e)
	}
}
