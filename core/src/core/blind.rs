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

//! Blinding factors, the scalars hidden inside Pedersen commitments, and the
//! accumulator used to sum them while building transactions.

use crate::ser::{self, Readable, Reader, Writeable, Writer};
use rand::thread_rng;
use std::cmp::min;
use std::fmt;
use util::secp::constants::SECRET_KEY_SIZE;
use util::secp::key::SecretKey;
use util::secp::{self, Secp256k1};
use util::ToHex;

/// A 32-byte scalar in the curve's scalar field, wrapping a secret key to
/// help with commitment generation. Unlike a secret key proper, the zero
/// value is representable and legal.
#[derive(Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlindingFactor([u8; SECRET_KEY_SIZE]);

impl fmt::Debug for BlindingFactor {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "{}", self.to_hex())
	}
}

impl AsRef<[u8]> for BlindingFactor {
	fn as_ref(&self) -> &[u8] {
		&self.0
	}
}

impl Writeable for BlindingFactor {
	fn write<W: Writer>(&self, writer: &mut W) -> Result<(), ser::Error> {
		writer.write_fixed_bytes(&self.0)
	}
}

impl Readable for BlindingFactor {
	fn read<R: Reader>(reader: &mut R) -> Result<BlindingFactor, ser::Error> {
		let bytes = reader.read_fixed_bytes(SECRET_KEY_SIZE)?;
		Ok(BlindingFactor::from_slice(&bytes))
	}
}

impl BlindingFactor {
	/// Construct from the scalar underlying a secret key.
	pub fn from_secret_key(skey: SecretKey) -> BlindingFactor {
		BlindingFactor::from_slice(skey.as_ref())
	}

	/// Construct from raw scalar bytes, zero padded if necessary.
	pub fn from_slice(data: &[u8]) -> BlindingFactor {
		let mut blind = [0; SECRET_KEY_SIZE];
		let copy_size = min(SECRET_KEY_SIZE, data.len());
		blind[..copy_size].copy_from_slice(&data[..copy_size]);
		BlindingFactor(blind)
	}

	/// The zero scalar. Not a valid secret key but a perfectly valid (and
	/// common) blinding factor, e.g. an unchanged total kernel offset.
	pub fn zero() -> BlindingFactor {
		BlindingFactor([0; SECRET_KEY_SIZE])
	}

	/// A random blinding factor.
	pub fn rand(secp: &Secp256k1) -> BlindingFactor {
		BlindingFactor::from_secret_key(SecretKey::new(secp, &mut thread_rng()))
	}

	/// Hex string representation.
	pub fn to_hex(&self) -> String {
		ToHex::to_hex(&self.0)
	}

	/// The secret key this blinding factor wraps. The zero blinding factor
	/// maps to the (otherwise invalid) zero key, which the secp lib accepts
	/// in blind sums.
	pub fn secret_key(&self, secp: &Secp256k1) -> Result<SecretKey, secp::Error> {
		if *self == BlindingFactor::zero() {
			Ok(secp::key::ZERO_KEY)
		} else {
			SecretKey::from_slice(secp, &self.0)
		}
	}

	/// Split a blinding_factor (aka secret_key) into a pair of
	/// blinding_factors. We use one of these (k1) to sign the tx kernel (k1G)
	/// and the other gets aggregated in the block_header as the "offset".
	/// This prevents an actor from being able to sum a set of inputs, outputs
	/// and kernels from a block to identify and reconstruct a particular tx
	/// from a block. You would need both k1, k2 to do this.
	pub fn split(&self, secp: &Secp256k1) -> Result<SplitBlindingFactor, secp::Error> {
		let skey_1 = SecretKey::new(secp, &mut thread_rng());

		// use blind_sum to subtract skey_1 from our key (to give k = k1 + k2)
		let skey = self.secret_key(secp)?;
		let skey_2 = secp.blind_sum(vec![skey], vec![skey_1.clone()])?;

		let blind_1 = BlindingFactor::from_secret_key(skey_1);
		let blind_2 = BlindingFactor::from_secret_key(skey_2);

		Ok(SplitBlindingFactor { blind_1, blind_2 })
	}
}

/// A blinding factor split into two halves summing to the original.
#[derive(Clone, Debug)]
pub struct SplitBlindingFactor {
	/// The half used to sign the kernel.
	pub blind_1: BlindingFactor,
	/// The half carried as the kernel offset.
	pub blind_2: BlindingFactor,
}

/// Accumulator to compute the sum of blinding factors, keeping track of the
/// "sign" with which each factor should be combined.
#[derive(Clone, Debug)]
pub struct BlindSum {
	/// Factors added to the sum.
	pub positive: Vec<BlindingFactor>,
	/// Factors subtracted from the sum.
	pub negative: Vec<BlindingFactor>,
}

impl BlindSum {
	/// Creates a new blinding factor sum.
	pub fn new() -> BlindSum {
		BlindSum {
			positive: vec![],
			negative: vec![],
		}
	}

	/// Adds the provided factor to the sum of blinding factors.
	pub fn add_blinding_factor(mut self, blind: BlindingFactor) -> BlindSum {
		self.positive.push(blind);
		self
	}

	/// Subtracts the provided factor from the sum of blinding factors.
	pub fn sub_blinding_factor(mut self, blind: BlindingFactor) -> BlindSum {
		self.negative.push(blind);
		self
	}

	/// Sum of positive factors less negative ones, modulo the curve order.
	pub fn sum(&self, secp: &Secp256k1) -> Result<BlindingFactor, secp::Error> {
		let positive = to_secrets(&self.positive, secp)?;
		let negative = to_secrets(&self.negative, secp)?;

		if positive.is_empty() && negative.is_empty() {
			Ok(BlindingFactor::zero())
		} else {
			let sum = secp.blind_sum(positive, negative)?;
			Ok(BlindingFactor::from_secret_key(sum))
		}
	}
}

impl Default for BlindSum {
	fn default() -> BlindSum {
		BlindSum::new()
	}
}

fn to_secrets(
	blinds: &[BlindingFactor],
	secp: &Secp256k1,
) -> Result<Vec<SecretKey>, secp::Error> {
	blinds
		.iter()
		.filter(|x| **x != BlindingFactor::zero())
		.map(|x| x.secret_key(secp))
		.collect()
}

#[cfg(test)]
mod test {
	use super::*;
	use util::secp::ContextFlag;

	#[test]
	fn split_and_recombine() {
		let secp = Secp256k1::with_caps(ContextFlag::Commit);
		let blind = BlindingFactor::rand(&secp);
		let split = blind.split(&secp).unwrap();

		let sum = BlindSum::new()
			.add_blinding_factor(split.blind_1)
			.add_blinding_factor(split.blind_2)
			.sum(&secp)
			.unwrap();

		assert_eq!(blind, sum);
	}

	#[test]
	fn zero_is_identity() {
		let secp = Secp256k1::with_caps(ContextFlag::Commit);
		let blind = BlindingFactor::rand(&secp);

		let sum = BlindSum::new()
			.add_blinding_factor(blind)
			.add_blinding_factor(BlindingFactor::zero())
			.sum(&secp)
			.unwrap();

		assert_eq!(blind, sum);

		let zero_sum = BlindSum::new().sum(&secp).unwrap();
		assert_eq!(zero_sum, BlindingFactor::zero());
	}

	#[test]
	fn serialize_deserialize() {
		let secp = Secp256k1::with_caps(ContextFlag::Commit);
		let blind = BlindingFactor::rand(&secp);

		let vec = crate::ser::ser_vec(&blind).unwrap();
		assert_eq!(vec.len(), 32);
		let blind_2: BlindingFactor = crate::ser::deserialize(&mut &vec[..]).unwrap();
		assert_eq!(blind, blind_2);
	}
}
