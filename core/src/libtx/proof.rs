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

//! Rangeproof library functions

use crate::blake2::blake2b::blake2b;
use crate::libtx::error::Error;
use util::secp::key::SecretKey;
use util::secp::pedersen::{Commitment, RangeProof};
use util::secp::{self, Secp256k1};

/// Create a bulletproof for the provided amount, blinded by the provided
/// secret key and bound to the commitment.
pub fn create(
	secp: &Secp256k1,
	blind: &SecretKey,
	amount: u64,
	commit: Commitment,
	extra_data: Option<Vec<u8>>,
) -> Result<RangeProof, Error> {
	let nonce = create_nonce(secp, &commit)?;
	Ok(secp.bullet_proof(
		amount,
		blind.clone(),
		nonce.clone(),
		nonce,
		extra_data,
		None,
	))
}

/// Verify a proof
pub fn verify(
	secp: &Secp256k1,
	commit: Commitment,
	proof: RangeProof,
	extra_data: Option<Vec<u8>>,
) -> Result<(), secp::Error> {
	let result = secp.verify_bullet_proof(commit, proof, extra_data);
	match result {
		Ok(_) => Ok(()),
		Err(e) => Err(e),
	}
}

// Deterministic nonce derived from the commitment the proof is bound to.
fn create_nonce(secp: &Secp256k1, commit: &Commitment) -> Result<SecretKey, Error> {
	let res = blake2b(32, &[], &commit.0);
	SecretKey::from_slice(secp, res.as_bytes())
		.map_err(|e| Error::RangeProof(format!("Unable to create nonce: {:?}", e)))
}

#[cfg(test)]
mod test {
	use super::*;
	use rand::thread_rng;
	use util::secp::ContextFlag;

	#[test]
	fn create_and_verify() {
		let secp = Secp256k1::with_caps(ContextFlag::Commit);
		let blind = SecretKey::new(&secp, &mut thread_rng());
		let commit = secp.commit(5, blind.clone()).unwrap();

		let proof = create(&secp, &blind, 5, commit, None).unwrap();
		assert!(verify(&secp, commit, proof, None).is_ok());

		// proof does not verify against a different commitment
		let other_commit = secp.commit(6, blind.clone()).unwrap();
		assert!(verify(&secp, other_commit, proof, None).is_err());
	}
}
