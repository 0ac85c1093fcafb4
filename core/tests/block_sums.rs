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

use common::{keygen, new_block, tx1i2o, tx2i1o, verifier_cache, MemoryBlockSums};
use mimble_core::core::block::BlockHeader;
use mimble_core::core::block_sums::{self, verify_block_sums, BlockSumsProvider};
use mimble_core::core::committed::sum_offsets;
use mimble_core::core::BlindingFactor;

#[test]
// a chain of three blocks, each validated against the accumulated sums of
// its predecessor
fn chain_of_block_sums() {
	let genesis = BlockHeader::default();

	let mut provider = MemoryBlockSums::new();
	provider.seed(&genesis.hash());

	let b1 = new_block(&[tx1i2o()], &keygen(), &genesis);
	let b2 = new_block(&[tx2i1o()], &keygen(), &b1.header);
	let b3 = new_block(&[tx1i2o(), tx2i1o()], &keygen(), &b2.header);

	for b in [&b1, &b2, &b3].iter() {
		// full self-consistency plus against-prior validation, with the
		// prior offset supplied by the accumulator
		let prev_offset = provider.get_total_kernel_offset(&b.header.prev_hash).unwrap();
		b.validate(&prev_offset, verifier_cache()).unwrap();

		let sums = verify_block_sums(b, &mut provider).unwrap();
		assert_eq!(provider.get_block_sums(&b.hash()).unwrap(), sums);

		provider.record_offset(&b.hash(), b.header.total_kernel_offset());
	}
}

#[test]
// asking for sums of an unknown predecessor propagates NotFound unchanged
fn unknown_predecessor() {
	let genesis = BlockHeader::default();

	let mut provider = MemoryBlockSums::new();
	// intentionally not seeded

	let b1 = new_block(&[], &keygen(), &genesis);
	match verify_block_sums(&b1, &mut provider) {
		Err(block_sums::Error::NotFound(h)) => assert_eq!(h, genesis.hash()),
		other => panic!("expected NotFound, got {:?}", other),
	}

	// and nothing was stored for the rejected block
	assert!(provider.get_block_sums(&b1.hash()).is_err());
}

#[test]
// a block whose declared offset does not match its kernels is rejected
// against prior state
fn bad_offset_rejected_against_prior_state() {
	let genesis = BlockHeader::default();

	let mut provider = MemoryBlockSums::new();
	provider.seed(&genesis.hash());

	let mut b1 = new_block(&[tx1i2o()], &keygen(), &genesis);
	b1.header.total_kernel_offset = BlindingFactor::from_slice(&[7u8; 32]);

	match verify_block_sums(&b1, &mut provider) {
		Err(block_sums::Error::Committed(_)) => (),
		other => panic!("expected kernel sum mismatch, got {:?}", other),
	}
}

#[test]
// per-block offsets are linear: the per-block deltas sum to the difference
// of the totals across the chain
fn offset_linearity() {
	let genesis = BlockHeader::default();

	let b1 = new_block(&[tx1i2o()], &keygen(), &genesis);
	let b2 = new_block(&[tx2i1o()], &keygen(), &b1.header);
	let b3 = new_block(&[tx1i2o()], &keygen(), &b2.header);

	let d1 = sum_offsets(
		vec![b1.header.total_kernel_offset()],
		vec![genesis.total_kernel_offset()],
	)
	.unwrap();
	let d2 = sum_offsets(
		vec![b2.header.total_kernel_offset()],
		vec![b1.header.total_kernel_offset()],
	)
	.unwrap();
	let d3 = sum_offsets(
		vec![b3.header.total_kernel_offset()],
		vec![b2.header.total_kernel_offset()],
	)
	.unwrap();

	let sum_of_deltas = sum_offsets(vec![d1, d2, d3], vec![]).unwrap();
	let total_delta = sum_offsets(
		vec![b3.header.total_kernel_offset()],
		vec![genesis.total_kernel_offset()],
	)
	.unwrap();

	assert_eq!(sum_of_deltas, total_delta);
}

#[test]
// an unchanged total kernel offset (an empty block on top of a chain with
// some offset) still reconciles
fn unchanged_offset_reconciles() {
	let genesis = BlockHeader::default();

	let mut provider = MemoryBlockSums::new();
	provider.seed(&genesis.hash());

	let b1 = new_block(&[tx1i2o()], &keygen(), &genesis);
	b1.validate(&BlindingFactor::zero(), verifier_cache())
		.unwrap();
	verify_block_sums(&b1, &mut provider).unwrap();
	provider.record_offset(&b1.hash(), b1.header.total_kernel_offset());

	// an empty block carries its predecessor's total forward untouched
	let b2 = new_block(&[], &keygen(), &b1.header);
	assert_eq!(
		b2.header.total_kernel_offset(),
		b1.header.total_kernel_offset()
	);

	let prev_offset = provider.get_total_kernel_offset(&b1.hash()).unwrap();
	b2.validate(&prev_offset, verifier_cache()).unwrap();
	verify_block_sums(&b2, &mut provider).unwrap();
}
