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

//! Builds the blinded output and related signature proof for the block
//! reward.

use crate::consensus::reward;
use crate::core::transaction::{KernelFeatures, Output, OutputFeatures, TxKernel};
use crate::libtx::error::Error;
use crate::libtx::{aggsig, proof};
use util::secp::key::SecretKey;
use util::secp::{ContextFlag, Secp256k1};

/// Output a reward output and the matching coinbase kernel for the provided
/// total fee amount. The coinbase kernel carries neither fee nor lock height.
pub fn output(key: &SecretKey, fees: u64) -> Result<(Output, TxKernel), Error> {
	let secp = Secp256k1::with_caps(ContextFlag::Commit);

	let value = reward(fees);
	let commit = secp.commit(value, key.clone())?;

	trace!("Block reward - Pedersen Commit is: {:?}", commit);

	let rproof = proof::create(&secp, key, value, commit, None)?;

	let output = Output::new(OutputFeatures::COINBASE_OUTPUT, commit, rproof);

	// The excess is the output commitment stripped of the transparent reward
	// value, which leaves key*G, so the reward key signs the kernel.
	let over_commit = secp.commit_value(value)?;
	let out_commit = output.commitment();
	let excess = secp.commit_sum(vec![out_commit], vec![over_commit])?;
	let pubkey = excess.to_pubkey(&secp)?;

	let mut kernel = TxKernel::empty();
	kernel.features = KernelFeatures::COINBASE_KERNEL;
	kernel.excess = excess;

	let msg = kernel.msg_to_sign()?;
	kernel.excess_sig = aggsig::sign_single(&secp, &msg, key, Some(&pubkey))?;

	Ok((output, kernel))
}

#[cfg(test)]
mod test {
	use super::*;
	use rand::thread_rng;

	#[test]
	fn reward_kernel_is_sound() {
		let secp = Secp256k1::with_caps(ContextFlag::Commit);
		let key = SecretKey::new(&secp, &mut thread_rng());

		let (out, kernel) = output(&key, 10).unwrap();

		assert!(out.is_coinbase());
		assert!(kernel.is_coinbase());
		assert_eq!(kernel.fee, 0);
		assert_eq!(kernel.lock_height, 0);

		out.verify_proof().unwrap();
		kernel.verify().unwrap();

		// the excess is just key*G
		assert_eq!(kernel.excess(), secp.commit(0, key).unwrap());
	}
}
