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

//! Blocks and blockheaders

use crate::consensus::{reward, REWARD};
use crate::core::blind::BlindingFactor;
use crate::core::committed::{self, Committed};
use crate::core::hash::{Hash, Hashed, ZERO_HASH};
use crate::core::transaction::{
	self, Input, Output, Transaction, TransactionBody, TxKernel, Weighting,
};
use crate::core::verifier_cache::VerifierCache;
use crate::ser::{self, Readable, Reader, Writeable, Writer};
use chrono::prelude::*;
use chrono::SubsecRound;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use util::secp::pedersen::Commitment;
use util::{secp, static_secp_instance, RwLock};

/// Errors thrown by Block validation
#[derive(Clone, Debug, PartialEq, thiserror::Error)]
pub enum Error {
	/// The sum of coinbase-marked output commitments does not match the sum
	/// of coinbase-marked kernel excesses, accounting for the reward
	#[error("Coinbase sum mismatch")]
	CoinbaseSumMismatch,
	/// Kernel not valid due to lock_height exceeding block header height
	#[error("Kernel lock height {0} greater than block height")]
	KernelLockHeight(u64),
	/// Underlying tx related error
	#[error("Transaction error {0}")]
	Transaction(transaction::Error),
	/// Underlying Secp256k1 error (signature validation or invalid public key
	/// typically)
	#[error("Secp error {0}")]
	Secp(secp::Error),
	/// Underlying error from summing commitments
	#[error("Committed error {0}")]
	Committed(committed::Error),
}

impl From<transaction::Error> for Error {
	fn from(e: transaction::Error) -> Error {
		Error::Transaction(e)
	}
}

impl From<secp::Error> for Error {
	fn from(e: secp::Error) -> Error {
		Error::Secp(e)
	}
}

impl From<committed::Error> for Error {
	fn from(e: committed::Error) -> Error {
		Error::Committed(e)
	}
}

/// Block header, fairly standard compared to other blockchains.
#[derive(Clone, Debug, PartialEq)]
pub struct BlockHeader {
	/// Version of the block
	pub version: u16,
	/// Height of this block since the genesis block (height 0)
	pub height: u64,
	/// Hash of the block previous to this in the chain.
	pub prev_hash: Hash,
	/// Timestamp at which the block was built.
	pub timestamp: DateTime<Utc>,
	/// Total accumulated difficulty since genesis block
	pub total_difficulty: u64,
	/// Merklish root of all the commitments in the TxHashSet
	pub output_root: Hash,
	/// Merklish root of all range proofs in the TxHashSet
	pub range_proof_root: Hash,
	/// Merklish root of all transaction kernels in the TxHashSet
	pub kernel_root: Hash,
	/// Total accumulated sum of kernel offsets since genesis block.
	/// We can derive the kernel offset sum for *this* block from
	/// the total kernel offset of the previous block header.
	pub total_kernel_offset: BlindingFactor,
}

impl Default for BlockHeader {
	fn default() -> BlockHeader {
		BlockHeader {
			version: 1,
			height: 0,
			prev_hash: ZERO_HASH,
			timestamp: Utc.timestamp_opt(0, 0).unwrap(),
			total_difficulty: 1,
			output_root: ZERO_HASH,
			range_proof_root: ZERO_HASH,
			kernel_root: ZERO_HASH,
			total_kernel_offset: BlindingFactor::zero(),
		}
	}
}

/// Serialization of a block header
impl Writeable for BlockHeader {
	fn write<W: Writer>(&self, writer: &mut W) -> Result<(), ser::Error> {
		writer.write_u16(self.version)?;
		writer.write_u64(self.height)?;
		self.prev_hash.write(writer)?;
		writer.write_i64(self.timestamp.timestamp())?;
		writer.write_u64(self.total_difficulty)?;
		self.output_root.write(writer)?;
		self.range_proof_root.write(writer)?;
		self.kernel_root.write(writer)?;
		self.total_kernel_offset.write(writer)?;
		Ok(())
	}
}

/// Deserialization of a block header
impl Readable for BlockHeader {
	fn read<R: Reader>(reader: &mut R) -> Result<BlockHeader, ser::Error> {
		let version = reader.read_u16()?;
		let height = reader.read_u64()?;
		let prev_hash = Hash::read(reader)?;
		let timestamp = reader.read_i64()?;
		let total_difficulty = reader.read_u64()?;
		let output_root = Hash::read(reader)?;
		let range_proof_root = Hash::read(reader)?;
		let kernel_root = Hash::read(reader)?;
		let total_kernel_offset = BlindingFactor::read(reader)?;

		if timestamp > (1 << 55) || timestamp < -(1 << 55) {
			return Err(ser::Error::CorruptedData);
		}
		let timestamp = Utc
			.timestamp_opt(timestamp, 0)
			.single()
			.ok_or(ser::Error::CorruptedData)?;

		Ok(BlockHeader {
			version,
			height,
			prev_hash,
			timestamp,
			total_difficulty,
			output_root,
			range_proof_root,
			kernel_root,
			total_kernel_offset,
		})
	}
}

impl BlockHeader {
	/// The hash of the header, which is the hash of the block as a whole.
	pub fn hash(&self) -> Hash {
		Hashed::hash(self)
	}

	/// Total kernel offset for the chain state up to and including this block.
	pub fn total_kernel_offset(&self) -> BlindingFactor {
		self.total_kernel_offset
	}

	/// The "overage" to use when verifying the kernel sums for a full block.
	/// The only value created with no input is the block subsidy, counted on
	/// the input side of the balance. Fees cancel out against the fee
	/// commitments already carried by each kernel excess.
	pub fn overage(&self) -> i64 {
		0i64 - (REWARD as i64)
	}
}

/// A block as expressed in the MimbleWimble protocol. The reward is
/// non-explicit, assumed to be deducible from block height (similar to
/// bitcoin's schedule) and expressed as a global transaction fee (added v.H),
/// additive to the total of fees ever collected.
///
/// Immutable once built, except for the `validated` marker which caches the
/// outcome of a successful self-consistency check so the expensive crypto is
/// not repeated. The marker is monotonic, a single relaxed atomic write on
/// success, never cleared.
#[derive(Debug)]
pub struct Block {
	/// The header with metadata and commitments to the rest of the data
	pub header: BlockHeader,
	/// The body - inputs/outputs/kernels
	pub body: TransactionBody,
	validated: AtomicBool,
}

impl Clone for Block {
	fn clone(&self) -> Block {
		Block {
			header: self.header.clone(),
			body: self.body.clone(),
			validated: AtomicBool::new(self.was_validated()),
		}
	}
}

/// Implementation of Writeable for a block, defines how to write the block to a
/// binary writer. Differentiates between writing the block for the purpose of
/// full serialization and the one of just extracting a hash.
impl Writeable for Block {
	fn write<W: Writer>(&self, writer: &mut W) -> Result<(), ser::Error> {
		self.header.write(writer)?;

		if writer.serialization_mode() != ser::SerializationMode::Hash {
			self.body.write(writer)?;
		}
		Ok(())
	}
}

/// Implementation of Readable for a block, defines how to read a full block
/// from a binary stream.
impl Readable for Block {
	fn read<R: Reader>(reader: &mut R) -> Result<Block, ser::Error> {
		let header = BlockHeader::read(reader)?;
		let body = TransactionBody::read(reader)?;
		Ok(Block {
			header,
			body,
			validated: AtomicBool::new(false),
		})
	}
}

/// A block is itself one big committed set, namely its body's inputs,
/// outputs and kernel excesses.
impl Committed for Block {
	fn input_commits(&self) -> Vec<Commitment> {
		self.body.input_commits()
	}

	fn output_commits(&self) -> Vec<Commitment> {
		self.body.output_commits()
	}

	fn kernel_excesses(&self) -> Vec<Commitment> {
		self.body.kernel_excesses()
	}
}

/// Default properties for a block, everything zeroed out and empty vectors.
impl Default for Block {
	fn default() -> Block {
		Block {
			header: Default::default(),
			body: Default::default(),
			validated: AtomicBool::new(false),
		}
	}
}

impl Block {
	/// Builds a new block from the header of the previous block, a vector of
	/// transactions and the coinbase output and kernel produced by the miner
	/// for the reward (plus total tx fees).
	///
	/// All inputs, outputs and kernels from the transactions are aggregated
	/// into a single body, any matching input/output pair across the
	/// aggregation is cut through, and the per-tx kernel offsets are summed
	/// with the previous total into the new total kernel offset.
	pub fn with_reward(
		prev: &BlockHeader,
		txs: &[Transaction],
		reward_out: Output,
		reward_kern: TxKernel,
		difficulty: u64,
	) -> Result<Block, Error> {
		// per-tx offsets, rolled into the header total once aggregation
		// is done
		let mut kernel_offsets: Vec<BlindingFactor> = vec![];

		let mut body = TransactionBody::empty();

		for tx in txs {
			kernel_offsets.push(tx.offset);

			for input in tx.inputs() {
				body = body.with_input(*input);
			}
			for output in tx.outputs() {
				body = body.with_output(*output);
			}
			for kernel in tx.kernels() {
				body = body.with_kernel(*kernel);
			}
		}

		// cut through any input spending an output created in this same
		// aggregation (coinbase outputs excluded)
		let body = body
			.cut_through()
			.with_output(reward_out)
			.with_kernel(reward_kern);

		// fold the per-tx offsets and the previous total into the new
		// running total carried by the header
		kernel_offsets.push(prev.total_kernel_offset);
		let total_kernel_offset = committed::sum_offsets(kernel_offsets, vec![])?;

		Ok(Block {
			header: BlockHeader {
				height: prev.height + 1,
				timestamp: Utc::now().trunc_subsecs(0),
				prev_hash: prev.hash(),
				total_difficulty: difficulty + prev.total_difficulty,
				total_kernel_offset,
				..Default::default()
			},
			body,
			validated: AtomicBool::new(false),
		})
	}

	/// Blockhash, the hash of the header only.
	pub fn hash(&self) -> Hash {
		self.header.hash()
	}

	/// Get inputs
	pub fn inputs(&self) -> &[Input] {
		&self.body.inputs
	}

	/// Get outputs
	pub fn outputs(&self) -> &[Output] {
		&self.body.outputs
	}

	/// Get kernels
	pub fn kernels(&self) -> &[TxKernel] {
		&self.body.kernels
	}

	/// Sum of all fees (inputs less outputs) in the block
	pub fn total_fees(&self) -> u64 {
		self.body.fee()
	}

	/// Has this block been through a successful self-consistency validation
	/// already? Readers may observe a stale `false` concurrently, which only
	/// costs a repeat validation, never admits an invalid block.
	pub fn was_validated(&self) -> bool {
		self.validated.load(Ordering::Relaxed)
	}

	fn mark_validated(&self) {
		self.validated.store(true, Ordering::Relaxed);
	}

	/// Validates all the elements in a block that can be checked without
	/// additional data. Includes commitment sums and kernels, reward, etc.
	///
	/// Idempotent: returns success without repeating the work if this block
	/// already passed. On success the block is marked accordingly.
	pub fn verify_self_consistent(
		&self,
		verifier: Arc<RwLock<dyn VerifierCache>>,
	) -> Result<(), Error> {
		if self.was_validated() {
			return Ok(());
		}

		self.body.validate(Weighting::AsBlock, verifier)?;
		self.verify_kernel_lock_heights()?;
		self.verify_coinbase()?;

		self.mark_validated();
		Ok(())
	}

	/// Fully validates the block: the self-consistency checks plus the
	/// overall commitment sums, given the total kernel offset accumulated up
	/// to (and including) the previous block. Returns the (unspendable)
	/// kernel sum of this block on success for callers tracking running
	/// totals.
	pub fn validate(
		&self,
		prev_kernel_offset: &BlindingFactor,
		verifier: Arc<RwLock<dyn VerifierCache>>,
	) -> Result<Commitment, Error> {
		self.verify_self_consistent(verifier)?;

		// take the kernel offset for this block (block offset minus previous)
		// and verify body inputs/outputs against the kernel sums
		let block_kernel_offset = self.block_kernel_offset(prev_kernel_offset)?;
		let (_utxo_sum, kernel_sum) =
			self.verify_kernel_sums(self.header.overage(), block_kernel_offset)?;

		Ok(kernel_sum)
	}

	// The per-block kernel offset, the header total minus the previous
	// header total (mod the curve order). Zero when the totals are equal.
	fn block_kernel_offset(
		&self,
		prev_kernel_offset: &BlindingFactor,
	) -> Result<BlindingFactor, Error> {
		if self.header.total_kernel_offset == *prev_kernel_offset {
			Ok(BlindingFactor::zero())
		} else {
			let offset = committed::sum_offsets(
				vec![self.header.total_kernel_offset],
				vec![*prev_kernel_offset],
			)?;
			Ok(offset)
		}
	}

	// Check we have no kernels with lock_heights greater than current height.
	// No tx can be included in a block earlier than its lock_height.
	fn verify_kernel_lock_heights(&self) -> Result<(), Error> {
		for k in self.kernels() {
			if k.lock_height > self.header.height {
				return Err(Error::KernelLockHeight(k.lock_height));
			}
		}
		Ok(())
	}

	/// Validate the coinbase outputs generated by miners.
	/// Check the sum of coinbase-marked outputs match
	/// the sum of coinbase-marked kernels accounting for fees.
	pub fn verify_coinbase(&self) -> Result<(), Error> {
		let cb_outs = self
			.outputs()
			.iter()
			.filter(|out| out.is_coinbase())
			.map(|out| out.commitment())
			.collect::<Vec<_>>();

		let cb_kerns = self
			.kernels()
			.iter()
			.filter(|kernel| kernel.is_coinbase())
			.map(|kernel| kernel.excess())
			.collect::<Vec<_>>();

		// The reward the coinbase output(s) commit to, the subsidy plus the
		// fees of every kernel in the block.
		let over_commit = {
			let secp = static_secp_instance();
			let secp = secp.lock();
			secp.commit_value(reward(self.total_fees()))?
		};

		let out_adjust_sum = committed::commit_sum(cb_outs, vec![over_commit])?;
		let kerns_sum = committed::commit_sum(cb_kerns, vec![])?;

		// Verify the kernel sum equals the output sum accounting for block fees.
		if kerns_sum != out_adjust_sum {
			return Err(Error::CoinbaseSumMismatch);
		}
		Ok(())
	}
}
