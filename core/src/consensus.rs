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

//! All the rules required for a cryptocurrency to have reach consensus across
//! the whole network are complex and hard to completely isolate. Some can be
//! simple parameters (like block reward), others complex algorithms (like
//! Merkle sum trees or reorg rules). However, as long as they're simple
//! enough, consensus-relevant constants and short functions should be kept
//! here.

/// A mimble is divisible to 10^9, following the SI prefixes
pub const COIN: u64 = 1_000_000_000;

/// The block subsidy amount, in nanocoins
pub const REWARD: u64 = 60 * COIN;

/// Actual block reward for a given total fee amount
pub fn reward(fee: u64) -> u64 {
	REWARD.saturating_add(fee)
}

/// Weight of an input when counted against the max block weight capacity
pub const INPUT_WEIGHT: u64 = 1;

/// Weight of an output when counted against the max block weight capacity
pub const OUTPUT_WEIGHT: u64 = 21;

/// Weight of a kernel when counted against the max block weight capacity
pub const KERNEL_WEIGHT: u64 = 3;

/// Total maximum block weight. The weight of a block is the sum of the
/// weights of all its inputs, outputs and kernels.
pub const MAX_BLOCK_WEIGHT: u64 = 40_000;

/// Maximum weight of a transaction. A transaction needs to leave enough
/// room in a block for the coinbase output and kernel.
pub const MAX_TX_WEIGHT: u64 = MAX_BLOCK_WEIGHT - (OUTPUT_WEIGHT + KERNEL_WEIGHT);

#[cfg(test)]
mod test {
	use super::*;

	#[test]
	fn test_reward() {
		assert_eq!(reward(0), REWARD);
		assert_eq!(reward(10), REWARD + 10);
		assert_eq!(reward(u64::max_value()), u64::max_value());
	}
}
