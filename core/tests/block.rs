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

mod common;

use common::{keygen, new_block, tx1i2o, tx2i1o, verifier_cache};
use mimble_core::core::block::{self, Block, BlockHeader};
use mimble_core::core::transaction::{self, KernelFeatures, OutputFeatures, TxKernel};
use mimble_core::core::verifier_cache::{LruVerifierCache, VerifierCache};
use mimble_core::core::{committed, BlindingFactor, Committed, Output};
use mimble_core::libtx::build::{self, input, output};
use mimble_core::libtx::reward;
use mimble_core::ser;
use std::sync::Arc;
use util::{secp, RwLock};

#[test]
// block with no inputs/outputs/kernels
// no fees, no reward, no coinbase
fn very_empty_block() {
	let b = Block::default();

	assert_eq!(
		b.verify_coinbase(),
		Err(block::Error::Committed(committed::Error::Secp(
			secp::Error::IncorrectCommitSum
		)))
	);
}

#[test]
fn empty_block_with_coinbase_is_valid() {
	let key = keygen();
	let prev = BlockHeader::default();
	let b = new_block(&[], &key, &prev);

	assert_eq!(b.header.height, 1);
	assert_eq!(b.inputs().len(), 0);
	assert_eq!(b.outputs().len(), 1);
	assert_eq!(b.kernels().len(), 1);

	let coinbase_outputs = b
		.outputs()
		.iter()
		.filter(|out| out.is_coinbase())
		.count();
	assert_eq!(coinbase_outputs, 1);

	let coinbase_kernels = b
		.kernels()
		.iter()
		.filter(|kernel| kernel.is_coinbase())
		.count();
	assert_eq!(coinbase_kernels, 1);

	// the block should be valid here (single coinbase output with
	// corresponding txn kernel)
	b.validate(&BlindingFactor::zero(), verifier_cache())
		.unwrap();
	assert!(b.was_validated());
}

#[test]
fn block_with_payment_is_valid() {
	let key = keygen();
	let prev = BlockHeader::default();
	let b = new_block(&[tx1i2o()], &key, &prev);

	assert_eq!(b.inputs().len(), 1);
	assert_eq!(b.outputs().len(), 3);
	assert_eq!(b.kernels().len(), 2);
	assert_eq!(b.total_fees(), 2);

	b.validate(&BlindingFactor::zero(), verifier_cache())
		.unwrap();
}

#[test]
// test that flipping the COINBASE_OUTPUT flag on the output features
// invalidates the block and specifically it causes verify_coinbase to fail
fn remove_coinbase_output_flag() {
	let key = keygen();
	let prev = BlockHeader::default();
	let mut b = new_block(&[], &key, &prev);

	assert!(b.outputs()[0].is_coinbase());
	b.body.outputs[0]
		.features
		.remove(OutputFeatures::COINBASE_OUTPUT);

	assert_eq!(b.verify_coinbase(), Err(block::Error::CoinbaseSumMismatch));

	// the overall kernel sums are untouched by the feature flag
	assert!(b
		.verify_kernel_sums(b.header.overage(), BlindingFactor::zero())
		.is_ok());

	assert_eq!(
		b.validate(&BlindingFactor::zero(), verifier_cache()),
		Err(block::Error::CoinbaseSumMismatch)
	);
	assert!(!b.was_validated());
}

#[test]
// test that flipping the COINBASE_KERNEL flag on the kernel features
// invalidates the block and specifically it causes verify_coinbase to fail
fn remove_coinbase_kernel_flag() {
	let key = keygen();
	let prev = BlockHeader::default();
	let mut b = new_block(&[], &key, &prev);

	assert!(b.kernels()[0].is_coinbase());
	b.body.kernels[0]
		.features
		.remove(KernelFeatures::COINBASE_KERNEL);

	// with no coinbase kernel left the coinbase side sums to nothing
	assert_eq!(
		b.verify_coinbase(),
		Err(block::Error::Committed(committed::Error::Secp(
			secp::Error::IncorrectCommitSum
		)))
	);

	// the kernel signature no longer matches its message either, since the
	// features are part of what was signed
	assert_eq!(
		b.body.kernels[0].verify(),
		Err(transaction::Error::IncorrectSignature)
	);
}

#[test]
// marking a non-coinbase output as coinbase must equally break the coinbase
// balance
fn add_coinbase_output_flag() {
	let key = keygen();
	let prev = BlockHeader::default();
	let mut b = new_block(&[tx1i2o()], &key, &prev);

	let plain = b
		.body
		.outputs
		.iter()
		.position(|out| !out.is_coinbase())
		.unwrap();
	b.body.outputs[plain]
		.features
		.insert(OutputFeatures::COINBASE_OUTPUT);

	assert_eq!(b.verify_coinbase(), Err(block::Error::CoinbaseSumMismatch));
}

#[test]
// a coinbase committing to one nanocoin more than reward plus fees fails
// the coinbase balance
fn inflated_coinbase_rejected() {
	let key = keygen();
	let prev = BlockHeader::default();
	let tx = tx1i2o();

	// miner claims one unit more than the block fees allow
	let (reward_out, reward_kern) = reward::output(&key, tx.fee() + 1).unwrap();
	let b = Block::with_reward(&prev, &[tx], reward_out, reward_kern, 1).unwrap();

	assert_eq!(
		b.validate(&BlindingFactor::zero(), verifier_cache()),
		Err(block::Error::CoinbaseSumMismatch)
	);
}

#[test]
// kernels with lock_height <= height are accepted, one block further back
// they are not
fn block_kernel_lock_heights() {
	let key = keygen();

	let tx = build::transaction(
		2,
		5,
		vec![input(10, keygen()), output(8, keygen())],
	)
	.unwrap();
	assert_eq!(tx.lock_height(), 5);

	// at exactly the lock height the block is fine
	let prev = BlockHeader {
		height: 4,
		..BlockHeader::default()
	};
	let b = new_block(&[tx.clone()], &key, &prev);
	assert_eq!(b.header.height, 5);
	b.validate(&BlindingFactor::zero(), verifier_cache())
		.unwrap();

	// one block earlier it is rejected
	let prev = BlockHeader {
		height: 3,
		..BlockHeader::default()
	};
	let b = new_block(&[tx], &key, &prev);
	assert_eq!(b.header.height, 4);
	assert_eq!(
		b.validate(&BlindingFactor::zero(), verifier_cache()),
		Err(block::Error::KernelLockHeight(5))
	);
	assert!(!b.was_validated());
}

#[test]
// swapping two kernels out of order causes body validation to fail,
// regardless of everything else being valid
fn unsorted_kernels_rejected() {
	let key = keygen();
	let prev = BlockHeader::default();
	let mut b = new_block(&[tx1i2o()], &key, &prev);

	assert_eq!(b.kernels().len(), 2);
	b.body.kernels.reverse();

	assert_eq!(
		b.validate(&BlindingFactor::zero(), verifier_cache()),
		Err(block::Error::Transaction(transaction::Error::Ser(
			ser::Error::SortError
		)))
	);
}

#[test]
fn duplicate_output_rejected() {
	let key = keygen();
	let prev = BlockHeader::default();
	let mut b = new_block(&[tx1i2o()], &key, &prev);

	let out = *b.body.outputs.last().unwrap();
	b.body.outputs.push(out);

	assert_eq!(
		b.validate(&BlindingFactor::zero(), verifier_cache()),
		Err(block::Error::Transaction(transaction::Error::Ser(
			ser::Error::DuplicateError
		)))
	);
}

#[test]
// perturbing the declared kernel offset breaks the overall balance identity
fn tampered_kernel_offset_rejected() {
	let key = keygen();
	let prev = BlockHeader::default();
	let mut b = new_block(&[tx1i2o()], &key, &prev);

	b.header.total_kernel_offset = BlindingFactor::from_slice(&[3u8; 32]);

	assert_eq!(
		b.validate(&BlindingFactor::zero(), verifier_cache()),
		Err(block::Error::Committed(committed::Error::KernelSumMismatch))
	);
}

#[test]
// flipping a single byte in an output commitment must cause rejection
fn tampered_output_commit_rejected() {
	let key = keygen();
	let prev = BlockHeader::default();
	let mut b = new_block(&[tx1i2o()], &key, &prev);

	b.body.outputs[0].commit.0[10] ^= 1;

	assert!(b
		.validate(&BlindingFactor::zero(), verifier_cache())
		.is_err());
}

#[test]
// builds a block with a tx spending another and check that cut_through occurred
fn block_with_cut_through() {
	let key = keygen();
	let shared_key = keygen();
	let prev = BlockHeader::default();

	let btx1 = tx2i1o();
	let btx2 = build::transaction(
		2,
		0,
		vec![input(7, keygen()), output(5, shared_key.clone())],
	)
	.unwrap();

	// spending tx2 - reuse shared_key
	let btx3 = build::transaction(
		2,
		0,
		vec![input(5, shared_key), output(3, keygen())],
	)
	.unwrap();

	let b = new_block(&[btx1, btx2, btx3], &key, &prev);

	// block should have been automatically compacted (including reward
	// output) and should still be valid
	b.validate(&BlindingFactor::zero(), verifier_cache())
		.unwrap();
	assert_eq!(b.inputs().len(), 3);
	assert_eq!(b.outputs().len(), 3);
	assert_eq!(b.kernels().len(), 4);
}

#[test]
fn serialize_deserialize_block() {
	let key = keygen();
	let prev = BlockHeader::default();
	let b = new_block(&[tx1i2o()], &key, &prev);

	let vec = ser::ser_vec(&b).expect("serialization failed");
	let b2: Block = ser::deserialize(&mut &vec[..]).unwrap();

	assert_eq!(b.header, b2.header);
	assert_eq!(b.inputs(), b2.inputs());
	assert_eq!(b.outputs(), b2.outputs());
	assert_eq!(b.kernels(), b2.kernels());

	// the hash of a block is the hash of its header alone
	assert_eq!(b.hash(), b2.hash());
	assert_eq!(b.hash(), b.header.hash());

	// the validation cache does not travel across the wire
	b.validate(&BlindingFactor::zero(), verifier_cache())
		.unwrap();
	let vec = ser::ser_vec(&b).expect("serialization failed");
	let b3: Block = ser::deserialize(&mut &vec[..]).unwrap();
	assert!(!b3.was_validated());
}

#[test]
fn empty_block_serialized_size() {
	let key = keygen();
	let prev = BlockHeader::default();
	let b = new_block(&[], &key, &prev);
	let vec = ser::ser_vec(&b).expect("serialization failed");
	// header 186, counts 24, coinbase output 717 (675 byte proof), kernel 114
	assert_eq!(vec.len(), 1_041);
}

// wrap an lru cache and count how many times the range proof filter runs
struct CountingVerifierCache {
	inner: LruVerifierCache,
	rangeproof_filter_calls: usize,
}

impl CountingVerifierCache {
	fn new() -> CountingVerifierCache {
		CountingVerifierCache {
			inner: LruVerifierCache::new(),
			rangeproof_filter_calls: 0,
		}
	}
}

impl VerifierCache for CountingVerifierCache {
	fn filter_kernel_sig_unverified(&mut self, kernels: &[TxKernel]) -> Vec<TxKernel> {
		self.inner.filter_kernel_sig_unverified(kernels)
	}
	fn filter_rangeproof_unverified(&mut self, outputs: &[Output]) -> Vec<Output> {
		self.rangeproof_filter_calls += 1;
		self.inner.filter_rangeproof_unverified(outputs)
	}
	fn add_kernel_sig_verified(&mut self, kernels: Vec<TxKernel>) {
		self.inner.add_kernel_sig_verified(kernels)
	}
	fn add_rangeproof_verified(&mut self, outputs: Vec<Output>) {
		self.inner.add_rangeproof_verified(outputs)
	}
}

#[test]
// a second validation of the same block performs no further range proof
// work and returns the same verdict
fn revalidation_is_cached_and_deterministic() {
	let key = keygen();
	let prev = BlockHeader::default();
	let b = new_block(&[tx1i2o()], &key, &prev);

	let cache = Arc::new(RwLock::new(CountingVerifierCache::new()));
	let vc: Arc<RwLock<dyn VerifierCache>> = cache.clone();

	let first = b.validate(&BlindingFactor::zero(), vc.clone()).unwrap();
	assert!(b.was_validated());
	assert_eq!(cache.read().rangeproof_filter_calls, 1);

	let second = b.validate(&BlindingFactor::zero(), vc.clone()).unwrap();
	assert_eq!(first, second);
	assert_eq!(cache.read().rangeproof_filter_calls, 1);
}
