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

//! Globally accessible static instance of secp256k1, to avoid
//! initialisation overhead

use crate::secp;
use crate::Mutex;
use rand::thread_rng;
use std::sync::Arc;

lazy_static! {
	/// Static reference to secp instance
	pub static ref SECP256K1: Arc<Mutex<secp::Secp256k1>> = Arc::new(Mutex::new(
		secp::Secp256k1::with_caps(secp::ContextFlag::Commit)
	));
	static ref ZERO_COMMIT: secp::pedersen::Commitment = {
		let secp = secp::Secp256k1::with_caps(secp::ContextFlag::Commit);
		secp.commit_value(0).unwrap()
	};
}

/// Returns the static instance, but calls randomize on it as well
/// (recommended to avoid side channel attacks).
pub fn static_secp_instance() -> Arc<Mutex<secp::Secp256k1>> {
	let mut secp_inst = SECP256K1.lock();
	secp_inst.randomize(&mut thread_rng());
	SECP256K1.clone()
}

/// The commitment to zero value with zero blinding factor.
/// Summing in a commitment to zero is a no-op so these get filtered out
/// before handing sets of commitments to the underlying secp lib.
pub fn commit_to_zero_value() -> secp::pedersen::Commitment {
	*ZERO_COMMIT
}

#[cfg(test)]
mod test {
	use super::*;

	#[test]
	fn zero_commit_is_stable() {
		let zero = commit_to_zero_value();
		assert_eq!(zero, commit_to_zero_value());

		let secp = static_secp_instance();
		let secp = secp.lock();
		assert_eq!(zero, secp.commit_value(0).unwrap());
	}
}
