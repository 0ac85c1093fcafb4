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

//! Common test fixtures: keys, transactions, blocks and an in-memory
//! block sums accumulator.

#![allow(dead_code)]

use mimble_core::core::block::{Block, BlockHeader};
use mimble_core::core::block_sums::{self, BlockSums, BlockSumsProvider};
use mimble_core::core::hash::Hash;
use mimble_core::core::verifier_cache::{LruVerifierCache, VerifierCache};
use mimble_core::core::{BlindingFactor, Transaction};
use mimble_core::libtx::build::{self, input, output};
use mimble_core::libtx::reward;
use rand::thread_rng;
use std::collections::HashMap;
use std::sync::Arc;
use util::secp::key::SecretKey;
use util::secp::{ContextFlag, Secp256k1};
use util::RwLock;

/// A fresh random secret key.
pub fn keygen() -> SecretKey {
	let secp = Secp256k1::with_caps(ContextFlag::Commit);
	SecretKey::new(&secp, &mut thread_rng())
}

/// A fresh verifier cache, boxed up the way validation expects it.
pub fn verifier_cache() -> Arc<RwLock<dyn VerifierCache>> {
	Arc::new(RwLock::new(LruVerifierCache::new()))
}

/// Transaction with 2 inputs and 1 output, fee 2.
pub fn tx2i1o() -> Transaction {
	build::transaction(
		2,
		0,
		vec![input(10, keygen()), input(11, keygen()), output(19, keygen())],
	)
	.unwrap()
}

/// Transaction with 1 input and 2 outputs, fee 2.
pub fn tx1i2o() -> Transaction {
	build::transaction(
		2,
		0,
		vec![input(10, keygen()), output(5, keygen()), output(3, keygen())],
	)
	.unwrap()
}

/// Build a block on the provided previous header from the given
/// transactions, with the coinbase reward paid to the provided key.
pub fn new_block(txs: &[Transaction], key: &SecretKey, prev: &BlockHeader) -> Block {
	let fees = txs.iter().map(|tx| tx.fee()).sum();
	let (reward_out, reward_kern) = reward::output(key, fees).unwrap();
	Block::with_reward(prev, txs, reward_out, reward_kern, 1).unwrap()
}

/// In-memory block sums accumulator, the provider a real node backs with
/// its database.
pub struct MemoryBlockSums {
	sums: HashMap<Hash, BlockSums>,
	offsets: HashMap<Hash, BlindingFactor>,
}

impl MemoryBlockSums {
	pub fn new() -> MemoryBlockSums {
		MemoryBlockSums {
			sums: HashMap::new(),
			offsets: HashMap::new(),
		}
	}

	/// Seed the accumulator with zero sums for a starting (genesis) block.
	pub fn seed(&mut self, h: &Hash) {
		self.sums.insert(*h, BlockSums::default());
		self.offsets.insert(*h, BlindingFactor::zero());
	}

	/// Record the total kernel offset of an accepted block, as a node would
	/// when persisting the header.
	pub fn record_offset(&mut self, h: &Hash, offset: BlindingFactor) {
		self.offsets.insert(*h, offset);
	}
}

impl BlockSumsProvider for MemoryBlockSums {
	fn get_block_sums(&self, h: &Hash) -> Result<BlockSums, block_sums::Error> {
		self.sums
			.get(h)
			.cloned()
			.ok_or(block_sums::Error::NotFound(*h))
	}

	fn get_total_kernel_offset(&self, h: &Hash) -> Result<BlindingFactor, block_sums::Error> {
		self.offsets
			.get(h)
			.cloned()
			.ok_or(block_sums::Error::NotFound(*h))
	}

	fn put_block_sums(&mut self, h: &Hash, sums: BlockSums) -> Result<(), block_sums::Error> {
		self.sums.insert(*h, sums);
		Ok(())
	}
}
