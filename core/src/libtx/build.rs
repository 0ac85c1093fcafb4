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

//! Utility functions to build transactions. Handles the blinding of
//! inputs and outputs, maintaining the sum of blinding factors, producing
//! the excess signature, etc.
//!
//! Each building function is a combinator that produces a function taking
//! a transaction and a sum of blinding factors, to return another transaction
//! and sum. Combinators can then be chained and executed using the
//! _transaction_ function.
//!
//! Example:
//! build::transaction(
//!   2,
//!   0,
//!   vec![
//!     input(75, key1),
//!     output(42, key2),
//!     output(31, key3),
//!   ]
//! )

use crate::core::blind::{BlindSum, BlindingFactor};
use crate::core::transaction::{Input, Output, OutputFeatures, Transaction, TxKernel};
use crate::libtx::error::Error;
use crate::libtx::{aggsig, proof};
use util::secp::key::SecretKey;
use util::secp::{ContextFlag, Secp256k1};

/// Context information available to transaction combinators.
pub struct Context {
	/// A secp context with its own capabilities, so building never contends
	/// with (or deadlocks against) the static validation instance.
	secp: Secp256k1,
}

impl Context {
	/// Create a new context for a transaction build.
	pub fn new() -> Context {
		Context {
			secp: Secp256k1::with_caps(ContextFlag::Commit),
		}
	}
}

impl Default for Context {
	fn default() -> Context {
		Context::new()
	}
}

/// Function type returned by the transaction combinators. Transforms a
/// (Transaction, BlindSum) tuple into another, given the provided context.
/// Will return an Err if something went wrong at any point during transaction
/// building.
pub type Append = dyn Fn(
	&Context,
	Result<(Transaction, BlindSum), Error>,
) -> Result<(Transaction, BlindSum), Error>;

fn build_input(value: u64, features: OutputFeatures, blind: SecretKey) -> Box<Append> {
	Box::new(
		move |build, acc| -> Result<(Transaction, BlindSum), Error> {
			let (tx, sum) = acc?;
			let commit = build.secp.commit(value, blind.clone())?;
			let input = Input::new(features, commit);
			Ok((
				tx.with_input(input),
				sum.sub_blinding_factor(BlindingFactor::from_secret_key(blind.clone())),
			))
		},
	)
}

/// Adds an input with the provided value and blinding key to the transaction
/// being built.
pub fn input(value: u64, blind: SecretKey) -> Box<Append> {
	debug!("Building input (spending regular output): {}", value);
	build_input(value, OutputFeatures::DEFAULT_OUTPUT, blind)
}

/// Adds a coinbase input spending a coinbase output.
pub fn coinbase_input(value: u64, blind: SecretKey) -> Box<Append> {
	debug!("Building input (spending coinbase): {}", value);
	build_input(value, OutputFeatures::COINBASE_OUTPUT, blind)
}

/// Adds an output with the provided value and blinding key to the
/// transaction being built.
pub fn output(value: u64, blind: SecretKey) -> Box<Append> {
	Box::new(
		move |build, acc| -> Result<(Transaction, BlindSum), Error> {
			let (tx, sum) = acc?;

			let commit = build.secp.commit(value, blind.clone())?;

			debug!("Building output: {}, {:?}", value, commit);

			let rproof = proof::create(&build.secp, &blind, value, commit, None)?;

			Ok((
				tx.with_output(Output::new(OutputFeatures::DEFAULT_OUTPUT, commit, rproof)),
				sum.add_blinding_factor(BlindingFactor::from_secret_key(blind.clone())),
			))
		},
	)
}

/// Builds a complete transaction from the provided combinators, with the
/// given fee and lock_height carried by its single kernel.
///
/// The sum of blinding factors is split into a random kernel offset kept on
/// the transaction and the remainder driving the kernel excess, which then
/// signs the kernel message.
pub fn transaction(
	fee: u64,
	lock_height: u64,
	elems: Vec<Box<Append>>,
) -> Result<Transaction, Error> {
	let ctx = Context::new();
	let (tx, sum) = elems.iter().fold(
		Ok((Transaction::empty(), BlindSum::new())),
		|acc, elem| elem(&ctx, acc),
	)?;

	let blind_sum = sum.sum(&ctx.secp)?;

	// Split the key so that the kernel offset lands in the tx
	// and the remainder drives the kernel excess.
	let split = blind_sum.split(&ctx.secp)?;
	let k1 = split.blind_1;
	let k2 = split.blind_2;

	let mut kern = TxKernel::empty()
		.with_fee(fee)
		.with_lock_height(lock_height);

	let skey = k1.secret_key(&ctx.secp)?;
	kern.excess = ctx.secp.commit(0, skey.clone())?;
	let pubkey = kern.excess.to_pubkey(&ctx.secp)?;

	let msg = kern.msg_to_sign()?;
	kern.excess_sig = aggsig::sign_single(&ctx.secp, &msg, &skey, Some(&pubkey))?;

	Ok(tx.with_kernel(kern).with_offset(k2))
}
