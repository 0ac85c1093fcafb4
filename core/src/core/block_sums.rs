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

//! Running commitment totals per block and the accumulator contract that
//! stores them. Keeping the utxo and kernel sums for every accepted block
//! lets a new block be checked against the whole chain state without
//! walking any history.

use crate::core::blind::BlindingFactor;
use crate::core::block::Block;
use crate::core::committed::{self, Committed};
use crate::core::hash::Hash;
use crate::ser::{self, Readable, Reader, Writeable, Writer};
use util::secp::pedersen::Commitment;
use util::secp_static;

/// Errors from the block sums accumulator.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum Error {
	/// No sums stored for the requested block hash. Typically the new block
	/// names a predecessor we have never validated.
	#[error("Block sums not found for {0}")]
	NotFound(Hash),
	/// Underlying error from summing commitments.
	#[error("Committed error {0}")]
	Committed(committed::Error),
	/// The backing store failed to read or write.
	#[error("Store error {0}")]
	Store(String),
}

impl From<committed::Error> for Error {
	fn from(e: committed::Error) -> Error {
		Error::Committed(e)
	}
}

/// The running totals as of a given block: every output still counted in
/// the utxo set summed into one commitment, and every kernel excess since
/// genesis summed into another.
#[derive(Debug, Clone, PartialEq)]
pub struct BlockSums {
	/// The sum of the unspent outputs.
	pub utxo_sum: Commitment,
	/// The sum of all kernels.
	pub kernel_sum: Commitment,
}

impl Writeable for BlockSums {
	fn write<W: Writer>(&self, writer: &mut W) -> Result<(), ser::Error> {
		self.utxo_sum.write(writer)?;
		self.kernel_sum.write(writer)?;
		Ok(())
	}
}

impl Readable for BlockSums {
	fn read<R: Reader>(reader: &mut R) -> Result<BlockSums, ser::Error> {
		Ok(BlockSums {
			utxo_sum: Commitment::read(reader)?,
			kernel_sum: Commitment::read(reader)?,
		})
	}
}

impl Default for BlockSums {
	fn default() -> BlockSums {
		let zero_commit = secp_static::commit_to_zero_value();
		BlockSums {
			utxo_sum: zero_commit,
			kernel_sum: zero_commit,
		}
	}
}

/// Stored totals paired with a newly arrived block form a committed set of
/// their own, the sums standing in for everything the chain did before.
/// Verifying kernel sums over the pair therefore checks the full chain
/// state with the block applied.
impl<'a> Committed for (BlockSums, &'a dyn Committed) {
	fn input_commits(&self) -> Vec<Commitment> {
		let (_, block) = self;
		block.input_commits()
	}

	fn output_commits(&self) -> Vec<Commitment> {
		let (sums, block) = self;
		let mut commits = vec![sums.utxo_sum];
		commits.extend(block.output_commits());
		commits
	}

	fn kernel_excesses(&self) -> Vec<Commitment> {
		let (sums, block) = self;
		let mut excesses = vec![sums.kernel_sum];
		excesses.extend(block.kernel_excesses());
		excesses
	}
}

/// The contract the chain's accumulator must honor for the validator:
/// hand back the running sums and total kernel offset associated with any
/// block hash previously stored, and persist the sums of a block that
/// passed validation against its prior state.
pub trait BlockSumsProvider {
	/// Get the block_sums stored for the given block hash.
	fn get_block_sums(&self, h: &Hash) -> Result<BlockSums, Error>;
	/// Get the total kernel offset accumulated up to and including the
	/// given block hash.
	fn get_total_kernel_offset(&self, h: &Hash) -> Result<BlindingFactor, Error>;
	/// Save block_sums for the given block hash.
	fn put_block_sums(&mut self, h: &Hash, sums: BlockSums) -> Result<(), Error>;
}

/// Validate a block against the running totals of the chain it extends.
/// The provider supplies the sums stored for the block's named parent;
/// applying this block on top of them must satisfy the balance identity,
/// with only this block's subsidy as overage (every earlier subsidy is
/// already baked into the parent's sums) and the header's accumulated
/// kernel offset matching the accumulated kernel side. On success the
/// updated totals are handed back to the provider and returned.
pub fn verify_block_sums(
	b: &Block,
	provider: &mut dyn BlockSumsProvider,
) -> Result<BlockSums, Error> {
	let prev_sums = provider.get_block_sums(&b.header.prev_hash)?;

	let (utxo_sum, kernel_sum) = (prev_sums, b as &dyn Committed)
		.verify_kernel_sums(b.header.overage(), b.header.total_kernel_offset())?;

	let sums = BlockSums {
		utxo_sum,
		kernel_sum,
	};
	provider.put_block_sums(&b.hash(), sums.clone())?;

	Ok(sums)
}
