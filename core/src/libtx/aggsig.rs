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

//! Aggregated signature functions used in the creation of kernel signatures.
//! This module interfaces into the underlying
//! [Rust Aggsig library](https://github.com/mimblewimble/rust-secp256k1-zkp/blob/master/src/aggsig.rs)

use crate::core::blind::BlindingFactor;
use crate::libtx::error::Error;
use util::secp::key::{PublicKey, SecretKey};
use util::secp::pedersen::Commitment;
use util::secp::{self, aggsig, Message, Secp256k1, Signature};

/// Creates a single-signer aggsig signature with the provided secret key.
/// Used for transaction kernel signatures, where the key is the part of the
/// summed blinding factors not published as the offset, and the (optional)
/// `pubkey_sum` encodes the kernel excess into the challenge.
pub fn sign_single(
	secp: &Secp256k1,
	msg: &Message,
	skey: &SecretKey,
	pubkey_sum: Option<&PublicKey>,
) -> Result<Signature, Error> {
	let sig = aggsig::sign_single(secp, msg, skey, None, None, None, pubkey_sum, None)?;
	Ok(sig)
}

/// Creates a single-signer aggsig signature from a blinding factor rather
/// than a bare secret key.
pub fn sign_with_blinding(
	secp: &Secp256k1,
	msg: &Message,
	blinding: &BlindingFactor,
	pubkey_sum: Option<&PublicKey>,
) -> Result<Signature, Error> {
	let skey = blinding.secret_key(secp)?;
	sign_single(secp, msg, &skey, pubkey_sum)
}

/// Simple verification of a single signature from a commitment. The public
/// key used to verify the signature is derived from the commit.
pub fn verify_single_from_commit(
	secp: &Secp256k1,
	sig: &Signature,
	msg: &Message,
	commit: &Commitment,
) -> Result<(), Error> {
	let pubkey = commit.to_pubkey(secp)?;
	if !verify_single(secp, sig, msg, None, &pubkey, Some(&pubkey), false) {
		return Err(Error::Signature("Signature validation error".to_string()));
	}
	Ok(())
}

/// Verifies a completed (summed) signature, which must include the message
/// and pubkey sum values that are used during signature creation time
/// to create 'e'.
pub fn verify_single(
	secp: &Secp256k1,
	sig: &Signature,
	msg: &Message,
	pubnonce: Option<&PublicKey>,
	pubkey: &PublicKey,
	pubkey_sum: Option<&PublicKey>,
	is_partial: bool,
) -> bool {
	aggsig::verify_single(
		secp, sig, msg, pubnonce, pubkey, pubkey_sum, None, is_partial,
	)
}

#[cfg(test)]
mod test {
	use super::*;
	use rand::thread_rng;
	use util::secp::ContextFlag;

	#[test]
	fn sign_and_verify_from_commit() {
		let secp = Secp256k1::with_caps(ContextFlag::Commit);
		let skey = SecretKey::new(&secp, &mut thread_rng());

		// treat the commitment to zero value under our key as the public key
		let commit = secp.commit(0, skey.clone()).unwrap();
		let pubkey = commit.to_pubkey(&secp).unwrap();

		let msg = Message::from_slice(&[7; 32]).unwrap();
		let sig = sign_single(&secp, &msg, &skey, Some(&pubkey)).unwrap();

		assert!(verify_single_from_commit(&secp, &sig, &msg, &commit).is_ok());

		// signature does not verify against a different message
		let msg2 = Message::from_slice(&[8; 32]).unwrap();
		assert!(verify_single_from_commit(&secp, &sig, &msg2, &commit).is_err());
	}
}
