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

//! Commitment arithmetic over anything that carries inputs, outputs and
//! kernels. The balance checks for transactions, blocks and whole-chain
//! totals are all built on the Committed trait defined here.

use crate::core::blind::BlindingFactor;
use util::secp::pedersen::Commitment;
use util::{secp, secp_static, static_secp_instance};

/// Errors from checking the commitment sums of a committed set.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum Error {
	/// Secp related error.
	#[error("Secp error {0}")]
	Secp(secp::Error),
	/// The output side and the kernel side of the balance do not agree.
	#[error("Kernel sum mismatch")]
	KernelSumMismatch,
	/// Overage too large to express as a commitment.
	#[error("Invalid value")]
	InvalidValue,
}

impl From<secp::Error> for Error {
	fn from(e: secp::Error) -> Error {
		Error::Secp(e)
	}
}

/// Implemented by everything that carries Pedersen commitments over its
/// inputs, outputs and kernels: transaction bodies, transactions, blocks
/// and running chain totals.
pub trait Committed {
	/// Commitments of all inputs being spent.
	fn input_commits(&self) -> Vec<Commitment>;

	/// Commitments of all outputs being created.
	fn output_commits(&self) -> Vec<Commitment>;

	/// Excess commitments of all kernels.
	fn kernel_excesses(&self) -> Vec<Commitment>;

	/// Net commitment of outputs less inputs. The overage, the transparent
	/// value entering or leaving the set, rides along as `overage·H`: an
	/// extra output when positive (a fee), an extra input when negative (a
	/// reward).
	fn utxo_sum(&self, overage: i64) -> Result<Commitment, Error> {
		let mut spent = self.input_commits();
		let mut created = self.output_commits();

		if overage != 0 {
			let magnitude = overage.checked_abs().ok_or(Error::InvalidValue)? as u64;
			let over_commit = {
				let secp = static_secp_instance();
				let secp = secp.lock();
				secp.commit_value(magnitude)?
			};
			if overage < 0 {
				spent.push(over_commit);
			} else {
				created.push(over_commit);
			}
		}

		commit_sum(created, spent)
	}

	/// Check the Mimblewimble balance identity over this set: outputs less
	/// inputs less overage on one side must equal the kernel excesses plus
	/// the kernel offset (as `offset·G`) on the other. Returns the two
	/// sums, with the offset left out of the kernel side, so callers can
	/// carry them forward as running totals.
	fn verify_kernel_sums(
		&self,
		overage: i64,
		kernel_offset: BlindingFactor,
	) -> Result<(Commitment, Commitment), Error> {
		let utxo_sum = self.utxo_sum(overage)?;
		let kernel_sum = commit_sum(self.kernel_excesses(), vec![])?;

		if utxo_sum != with_offset(kernel_sum, &kernel_offset)? {
			return Err(Error::KernelSumMismatch);
		}

		Ok((utxo_sum, kernel_sum))
	}
}

// An excess sum with the kernel offset folded in, as the commitment to
// zero value under the offset key.
fn with_offset(
	excess_sum: Commitment,
	kernel_offset: &BlindingFactor,
) -> Result<Commitment, Error> {
	if *kernel_offset == BlindingFactor::zero() {
		return Ok(excess_sum);
	}

	let offset_commit = {
		let secp = static_secp_instance();
		let secp = secp.lock();
		let key = kernel_offset.secret_key(&secp)?;
		secp.commit(0, key)?
	};

	commit_sum(vec![excess_sum, offset_commit], vec![])
}

/// Sum two sets of commitments, the second subtracted from the first.
/// Commitments to zero carry no information and are dropped before handing
/// the sets to the curve library.
pub fn commit_sum(
	positive: Vec<Commitment>,
	negative: Vec<Commitment>,
) -> Result<Commitment, Error> {
	let zero = secp_static::commit_to_zero_value();
	let positive: Vec<_> = positive.into_iter().filter(|c| *c != zero).collect();
	let negative: Vec<_> = negative.into_iter().filter(|c| *c != zero).collect();

	let secp = static_secp_instance();
	let secp = secp.lock();
	let sum = secp.commit_sum(positive, negative)?;
	Ok(sum)
}

/// Sum sets of blinding factors, as in kernel offsets, the second set
/// subtracted from the first, modulo the curve order. Zero factors drop
/// out up front and an all-zero positive set short-circuits to zero, so
/// the degenerate empty sums never reach the curve library.
pub fn sum_offsets(
	positive: Vec<BlindingFactor>,
	negative: Vec<BlindingFactor>,
) -> Result<BlindingFactor, Error> {
	let secp = static_secp_instance();
	let secp = secp.lock();

	let mut keys = Vec::with_capacity(positive.len());
	for blind in positive.iter().filter(|b| **b != BlindingFactor::zero()) {
		keys.push(blind.secret_key(&secp)?);
	}
	if keys.is_empty() {
		return Ok(BlindingFactor::zero());
	}

	let mut neg_keys = Vec::with_capacity(negative.len());
	for blind in negative.iter().filter(|b| **b != BlindingFactor::zero()) {
		neg_keys.push(blind.secret_key(&secp)?);
	}

	let sum = secp.blind_sum(keys, neg_keys)?;
	Ok(BlindingFactor::from_secret_key(sum))
}
