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

//! Transactions

use crate::consensus;
use crate::core::blind::BlindingFactor;
use crate::core::committed::{self, Committed};
use crate::core::hash::HashWriter;
use crate::core::verifier_cache::VerifierCache;
use crate::ser::{
	self, read_and_verify_sorted, Readable, Reader, VerifySortedAndUnique, Writeable, Writer,
};
use std::cmp::Ordering;
use std::collections::HashSet;
use std::sync::Arc;
use util::secp::pedersen::{Commitment, RangeProof};
use util::secp::{self, aggsig, Message, Signature};
use util::{static_secp_instance, RwLock};

bitflags! {
	/// Options for a kernel's structure or use
	#[derive(Serialize, Deserialize)]
	pub struct KernelFeatures: u8 {
		/// No flags
		const DEFAULT_KERNEL = 0b0000_0000;
		/// Kernel matching a coinbase output
		const COINBASE_KERNEL = 0b0000_0001;
		/// Kernel carrying a lock_height the chain must reach before the
		/// containing transaction is accepted into a block
		const HEIGHT_LOCKED = 0b0000_0010;
	}
}

bitflags! {
	/// Options for an output's structure or use
	#[derive(Serialize, Deserialize)]
	pub struct OutputFeatures: u8 {
		/// No flags
		const DEFAULT_OUTPUT = 0b0000_0000;
		/// Output is a coinbase output, must not be spent until maturity
		const COINBASE_OUTPUT = 0b0000_0001;
	}
}

// Inputs, outputs and kernels are ordered (and deduplicated) by the byte
// representation of their commitment, the canonical on-chain ordering.
// Kernels order by their excess commitment.
macro_rules! commit_ord {
	($commitable:ident, $field:ident) => {
		impl Ord for $commitable {
			fn cmp(&self, other: &$commitable) -> Ordering {
				self.$field.0.cmp(&other.$field.0)
			}
		}
		impl PartialOrd for $commitable {
			fn partial_cmp(&self, other: &$commitable) -> Option<Ordering> {
				Some(self.cmp(other))
			}
		}
		impl PartialEq for $commitable {
			fn eq(&self, other: &$commitable) -> bool {
				self.$field.0[..] == other.$field.0[..]
			}
		}
		impl Eq for $commitable {}
	};
}

/// Errors thrown by Transaction validation
#[derive(Clone, Debug, PartialEq, thiserror::Error)]
pub enum Error {
	/// Underlying Secp256k1 error (signature validation or invalid public key
	/// typically)
	#[error("Secp error {0}")]
	Secp(secp::Error),
	/// Underlying error from summing commitments
	#[error("Committed error {0}")]
	Committed(committed::Error),
	/// Underlying serialization error (sort order or duplicates typically)
	#[error("Serialization error {0}")]
	Ser(ser::Error),
	/// Range proof validation error
	#[error("Invalid range proof")]
	RangeProof,
	/// Error originating from an invalid kernel signature
	#[error("Incorrect signature")]
	IncorrectSignature,
	/// The transaction or block weight exceeds the consensus maximum
	#[error("Weight exceeded")]
	WeightExceeded,
	/// An input overlaps with an output, cut-through was not performed
	#[error("Cut-through not performed, commitment both spent and created")]
	CutThrough,
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

impl From<ser::Error> for Error {
	fn from(e: ser::Error) -> Error {
		Error::Ser(e)
	}
}

/// A proof that a transaction sums to zero. Includes both the transaction's
/// Pedersen commitment and the signature, that guarantees that the commitments
/// amount to zero.
/// The signature signs the fee and the lock_height, which are retained for
/// signature validation.
#[derive(Debug, Clone, Copy)]
pub struct TxKernel {
	/// Options for a kernel's structure or use
	pub features: KernelFeatures,
	/// Fee originally included in the transaction this proof is for.
	pub fee: u64,
	/// This kernel is not valid earlier than lock_height blocks
	/// The max lock_height of all *inputs* to this transaction
	pub lock_height: u64,
	/// Remainder of the sum of all transaction commitments. If the transaction
	/// is well formed, amounts components should sum to zero and the excess
	/// is hence a valid public key.
	pub excess: Commitment,
	/// The signature proving the excess is a valid public key, which signs
	/// the transaction fee.
	pub excess_sig: Signature,
}

commit_ord!(TxKernel, excess);

impl Writeable for TxKernel {
	fn write<W: Writer>(&self, writer: &mut W) -> Result<(), ser::Error> {
		writer.write_u8(self.features.bits())?;
		writer.write_u64(self.fee)?;
		writer.write_u64(self.lock_height)?;
		self.excess.write(writer)?;
		self.excess_sig.write(writer)?;
		Ok(())
	}
}

impl Readable for TxKernel {
	fn read<R: Reader>(reader: &mut R) -> Result<TxKernel, ser::Error> {
		let features =
			KernelFeatures::from_bits(reader.read_u8()?).ok_or(ser::Error::CorruptedData)?;
		Ok(TxKernel {
			features,
			fee: reader.read_u64()?,
			lock_height: reader.read_u64()?,
			excess: Commitment::read(reader)?,
			excess_sig: Signature::read(reader)?,
		})
	}
}

impl TxKernel {
	/// The excess commitment of this kernel.
	pub fn excess(&self) -> Commitment {
		self.excess
	}

	/// Is this a coinbase kernel?
	pub fn is_coinbase(&self) -> bool {
		self.features.contains(KernelFeatures::COINBASE_KERNEL)
	}

	/// The message signed by the excess, binding features, fee and
	/// lock_height of the kernel.
	pub fn msg_to_sign(&self) -> Result<Message, Error> {
		let mut hasher = HashWriter::default();
		hasher.write_u8(self.features.bits())?;
		hasher.write_u64(self.fee)?;
		hasher.write_u64(self.lock_height)?;
		let mut bytes = [0; 32];
		hasher.finalize(&mut bytes);
		let msg = Message::from_slice(&bytes)?;
		Ok(msg)
	}

	/// Verify the transaction proof validity. Entails handling the commitment
	/// as a public key and checking the signature verifies with the kernel
	/// message.
	pub fn verify(&self) -> Result<(), Error> {
		let msg = self.msg_to_sign()?;
		let secp = static_secp_instance();
		let secp = secp.lock();
		let sig = &self.excess_sig;
		let pubkey = &self.excess.to_pubkey(&secp)?;
		if !aggsig::verify_single(&secp, sig, &msg, None, pubkey, Some(pubkey), None, false) {
			return Err(Error::IncorrectSignature);
		}
		Ok(())
	}

	/// Batch signature verification over a set of kernels.
	pub fn batch_sig_verify(kernels: &[TxKernel]) -> Result<(), Error> {
		let len = kernels.len();
		let mut sigs = Vec::with_capacity(len);
		let mut pubkeys = Vec::with_capacity(len);
		let mut msgs = Vec::with_capacity(len);

		let secp = static_secp_instance();
		let secp = secp.lock();

		for kernel in kernels {
			sigs.push(kernel.excess_sig);
			pubkeys.push(kernel.excess.to_pubkey(&secp)?);
			msgs.push(kernel.msg_to_sign()?);
		}

		if !aggsig::verify_batch(&secp, &sigs, &msgs, &pubkeys) {
			return Err(Error::IncorrectSignature);
		}

		Ok(())
	}

	/// Build an empty tx kernel with zero values.
	pub fn empty() -> TxKernel {
		TxKernel {
			features: KernelFeatures::DEFAULT_KERNEL,
			fee: 0,
			lock_height: 0,
			excess: Commitment::from_vec(vec![0; 33]),
			excess_sig: Signature::from_raw_data(&[0; 64]).unwrap(),
		}
	}

	/// Builds a new tx kernel with the provided fee.
	pub fn with_fee(self, fee: u64) -> TxKernel {
		TxKernel { fee, ..self }
	}

	/// Builds a new tx kernel with the provided lock_height.
	pub fn with_lock_height(self, lock_height: u64) -> TxKernel {
		TxKernel {
			features: kernel_features(lock_height),
			lock_height,
			..self
		}
	}
}

/// Construct the appropriate kernel features for the provided lock_height.
pub fn kernel_features(lock_height: u64) -> KernelFeatures {
	if lock_height > 0 {
		KernelFeatures::HEIGHT_LOCKED
	} else {
		KernelFeatures::DEFAULT_KERNEL
	}
}

/// A transaction input.
///
/// Primarily a reference to an output being spent by the transaction.
#[derive(Debug, Clone, Copy)]
pub struct Input {
	/// The features of the output being spent.
	/// We will check maturity for coinbase output.
	pub features: OutputFeatures,
	/// The commit referencing the output being spent.
	pub commit: Commitment,
}

commit_ord!(Input, commit);

impl Writeable for Input {
	fn write<W: Writer>(&self, writer: &mut W) -> Result<(), ser::Error> {
		writer.write_u8(self.features.bits())?;
		self.commit.write(writer)?;
		Ok(())
	}
}

impl Readable for Input {
	fn read<R: Reader>(reader: &mut R) -> Result<Input, ser::Error> {
		let features =
			OutputFeatures::from_bits(reader.read_u8()?).ok_or(ser::Error::CorruptedData)?;
		let commit = Commitment::read(reader)?;
		Ok(Input::new(features, commit))
	}
}

/// The input for a transaction, which spends a pre-existing unspent output.
/// The input commitment is a reproduction of the commitment of the output
/// being spent. Inputs must also provide the original output features, as
/// spent coinbase outputs are subject to a maturity rule enforced by the
/// chain above us.
impl Input {
	/// Build a new input from the data required to identify and verify an
	/// output being spent.
	pub fn new(features: OutputFeatures, commit: Commitment) -> Input {
		Input { features, commit }
	}

	/// The input commitment which identifies the output being spent.
	pub fn commitment(&self) -> Commitment {
		self.commit
	}

	/// Is this input spending a coinbase output?
	pub fn is_coinbase(&self) -> bool {
		self.features.contains(OutputFeatures::COINBASE_OUTPUT)
	}
}

/// Output for a transaction, defining the new ownership of coins that are
/// being transferred. The commitment is a blinded value for the output while
/// the range proof guarantees the commitment includes a positive value
/// without overflow and the ownership of the private key.
#[derive(Debug, Clone, Copy)]
pub struct Output {
	/// Options for an output's structure or use
	pub features: OutputFeatures,
	/// The homomorphic commitment representing the output amount
	pub commit: Commitment,
	/// A proof that the commitment is in the right range
	pub proof: RangeProof,
}

commit_ord!(Output, commit);

impl Writeable for Output {
	fn write<W: Writer>(&self, writer: &mut W) -> Result<(), ser::Error> {
		writer.write_u8(self.features.bits())?;
		self.commit.write(writer)?;
		self.proof.write(writer)?;
		Ok(())
	}
}

impl Readable for Output {
	fn read<R: Reader>(reader: &mut R) -> Result<Output, ser::Error> {
		let features =
			OutputFeatures::from_bits(reader.read_u8()?).ok_or(ser::Error::CorruptedData)?;
		Ok(Output {
			features,
			commit: Commitment::read(reader)?,
			proof: RangeProof::read(reader)?,
		})
	}
}

impl Output {
	/// Create a new output with the provided features, commitment and range
	/// proof.
	pub fn new(features: OutputFeatures, commit: Commitment, proof: RangeProof) -> Output {
		Output {
			features,
			commit,
			proof,
		}
	}

	/// Commitment for the output
	pub fn commitment(&self) -> Commitment {
		self.commit
	}

	/// Is this a coinbase output?
	pub fn is_coinbase(&self) -> bool {
		self.features.contains(OutputFeatures::COINBASE_OUTPUT)
	}

	/// Range proof for the output
	pub fn proof(&self) -> RangeProof {
		self.proof
	}

	/// Validates the range proof using the commitment
	pub fn verify_proof(&self) -> Result<(), Error> {
		let secp = static_secp_instance();
		let secp = secp.lock();
		secp.verify_bullet_proof(self.commit, self.proof, None)
			.map_err(|_| Error::RangeProof)?;
		Ok(())
	}

	/// Batch validates the range proofs using the commitments
	pub fn batch_verify_proofs(commits: &[Commitment], proofs: &[RangeProof]) -> Result<(), Error> {
		let secp = static_secp_instance();
		let secp = secp.lock();
		secp.verify_bullet_proof_multi(commits.to_vec(), proofs.to_vec(), None)
			.map_err(|_| Error::RangeProof)?;
		Ok(())
	}
}

/// Enum of various flavors/versions of TransactionBody.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Weighting {
	/// Tx against max tx weight. Transactions must also have had cut-through
	/// performed, a commitment cannot be both spent and created in the same
	/// transaction.
	AsTransaction,
	/// Block against max block weight. An aggregated block may legitimately
	/// contain a commitment both as input and output across the aggregated
	/// set, so cut-through is not enforced here.
	AsBlock,
}

/// TransactionBody is a common abstraction for transaction and block,
/// the ordered triple of inputs, outputs and kernels.
#[derive(Debug, Clone)]
pub struct TransactionBody {
	/// List of inputs spent by the transaction.
	pub inputs: Vec<Input>,
	/// List of outputs the transaction produces.
	pub outputs: Vec<Output>,
	/// List of kernels that make up this transaction (usually a single kernel).
	pub kernels: Vec<TxKernel>,
}

/// Implementation of Writeable for a body, defines how to
/// write the body as binary. Each of the three collections is
/// length-prefixed and relies on the canonical sort order invariant.
impl Writeable for TransactionBody {
	fn write<W: Writer>(&self, writer: &mut W) -> Result<(), ser::Error> {
		writer.write_u64(self.inputs.len() as u64)?;
		self.inputs.write(writer)?;
		writer.write_u64(self.outputs.len() as u64)?;
		self.outputs.write(writer)?;
		writer.write_u64(self.kernels.len() as u64)?;
		self.kernels.write(writer)?;
		Ok(())
	}
}

/// Implementation of Readable for a body, defines how to read a
/// body from a binary stream.
impl Readable for TransactionBody {
	fn read<R: Reader>(reader: &mut R) -> Result<TransactionBody, ser::Error> {
		let num_inputs = reader.read_u64()?;
		if num_inputs > consensus::MAX_BLOCK_WEIGHT / consensus::INPUT_WEIGHT {
			return Err(ser::Error::TooLargeReadErr);
		}
		let inputs = read_and_verify_sorted(reader, num_inputs)?;

		let num_outputs = reader.read_u64()?;
		if num_outputs > consensus::MAX_BLOCK_WEIGHT / consensus::OUTPUT_WEIGHT {
			return Err(ser::Error::TooLargeReadErr);
		}
		let outputs = read_and_verify_sorted(reader, num_outputs)?;

		let num_kernels = reader.read_u64()?;
		if num_kernels > consensus::MAX_BLOCK_WEIGHT / consensus::KERNEL_WEIGHT {
			return Err(ser::Error::TooLargeReadErr);
		}
		let kernels = read_and_verify_sorted(reader, num_kernels)?;

		Ok(TransactionBody {
			inputs,
			outputs,
			kernels,
		})
	}
}

impl Committed for TransactionBody {
	fn input_commits(&self) -> Vec<Commitment> {
		self.inputs.iter().map(|x| x.commitment()).collect()
	}

	fn output_commits(&self) -> Vec<Commitment> {
		self.outputs.iter().map(|x| x.commitment()).collect()
	}

	fn kernel_excesses(&self) -> Vec<Commitment> {
		self.kernels.iter().map(|x| x.excess()).collect()
	}
}

impl Default for TransactionBody {
	fn default() -> TransactionBody {
		TransactionBody::empty()
	}
}

impl TransactionBody {
	/// Creates a new empty transaction (no inputs or outputs, zero fee).
	pub fn empty() -> TransactionBody {
		TransactionBody {
			inputs: vec![],
			outputs: vec![],
			kernels: vec![],
		}
	}

	/// Creates a new transaction body initialized with
	/// the provided inputs, outputs and kernels.
	/// Guarantees inputs, outputs, kernels are sorted canonically.
	pub fn init(
		inputs: Vec<Input>,
		outputs: Vec<Output>,
		kernels: Vec<TxKernel>,
		verify_sorted: bool,
	) -> Result<TransactionBody, Error> {
		let mut body = TransactionBody {
			inputs,
			outputs,
			kernels,
		};

		if verify_sorted {
			// If we are verifying sort order then verify and
			// return an error if not sorted correctly.
			body.verify_sorted()?;
		} else {
			// If we are not verifying sort order then sort in place.
			body.sort();
		}
		Ok(body)
	}

	/// Sort the inputs|outputs|kernels.
	pub fn sort(&mut self) {
		self.inputs.sort_unstable();
		self.outputs.sort_unstable();
		self.kernels.sort_unstable();
	}

	/// Builds a new body with the provided input added. Existing
	/// inputs, if any, are kept intact. Sort order is maintained.
	pub fn with_input(mut self, input: Input) -> TransactionBody {
		if let Err(e) = self.inputs.binary_search(&input) {
			self.inputs.insert(e, input)
		};
		self
	}

	/// Builds a new body with the provided output added. Existing
	/// outputs, if any, are kept intact. Sort order is maintained.
	pub fn with_output(mut self, output: Output) -> TransactionBody {
		if let Err(e) = self.outputs.binary_search(&output) {
			self.outputs.insert(e, output)
		};
		self
	}

	/// Builds a new body with the provided kernel added. Existing
	/// kernels, if any, are kept intact. Sort order is maintained.
	pub fn with_kernel(mut self, kernel: TxKernel) -> TransactionBody {
		if let Err(e) = self.kernels.binary_search(&kernel) {
			self.kernels.insert(e, kernel)
		};
		self
	}

	/// Total fee for a TransactionBody is the sum of fees of all kernels.
	/// This intentionally spans all kernels, coinbase ones included, which
	/// by convention carry a zero fee.
	pub fn fee(&self) -> u64 {
		self.kernels
			.iter()
			.fold(0, |acc, k| acc.saturating_add(k.fee))
	}

	/// Calculate transaction weight
	pub fn weight(&self) -> u64 {
		TransactionBody::weight_by_iok(
			self.inputs.len() as u64,
			self.outputs.len() as u64,
			self.kernels.len() as u64,
		)
	}

	/// Calculate weight of matching inputs, outputs and kernels
	pub fn weight_by_iok(num_inputs: u64, num_outputs: u64, num_kernels: u64) -> u64 {
		num_inputs
			.saturating_mul(consensus::INPUT_WEIGHT)
			.saturating_add(num_outputs.saturating_mul(consensus::OUTPUT_WEIGHT))
			.saturating_add(num_kernels.saturating_mul(consensus::KERNEL_WEIGHT))
	}

	// Verify the body is not too heavy for the provided context.
	fn verify_weight(&self, weighting: Weighting) -> Result<(), Error> {
		let max_weight = match weighting {
			Weighting::AsTransaction => consensus::MAX_TX_WEIGHT,
			Weighting::AsBlock => consensus::MAX_BLOCK_WEIGHT,
		};

		if self.weight() > max_weight {
			return Err(Error::WeightExceeded);
		}

		Ok(())
	}

	// Verify the canonical sort order and uniqueness of inputs, outputs and
	// kernels. Duplicates are indistinguishable from a sort violation under a
	// strict ordering so both are covered here.
	fn verify_sorted(&self) -> Result<(), Error> {
		self.inputs.verify_sorted_and_unique()?;
		self.outputs.verify_sorted_and_unique()?;
		self.kernels.verify_sorted_and_unique()?;
		Ok(())
	}

	// Verify that no input is spending an output from the same body.
	fn verify_cut_through(&self) -> Result<(), Error> {
		let mut out_set = HashSet::new();
		for out in &self.outputs {
			out_set.insert(out.commitment());
		}
		for input in &self.inputs {
			if out_set.contains(&input.commitment()) {
				return Err(Error::CutThrough);
			}
		}
		Ok(())
	}

	/// Matches any output with a potential spending input, eliminating them
	/// from the body. Provides a simple way to cut-through an aggregated
	/// body of transactions. The elimination is stable with respect to the
	/// order of inputs and outputs.
	///
	/// NOTE: exclude coinbase from cut-through process. If an aggregation
	/// contains a new coinbase output and a transaction spending a previous
	/// coinbase we do not want to cut-through (all coinbase must be
	/// preserved).
	pub fn cut_through(self) -> TransactionBody {
		let in_set = self
			.inputs
			.iter()
			.map(|inp| inp.commitment())
			.collect::<HashSet<_>>();

		let out_set = self
			.outputs
			.iter()
			.filter(|out| !out.is_coinbase())
			.map(|out| out.commitment())
			.collect::<HashSet<_>>();

		let to_cut_through = in_set.intersection(&out_set).collect::<HashSet<_>>();

		let new_inputs = self
			.inputs
			.iter()
			.filter(|inp| !to_cut_through.contains(&inp.commitment()))
			.cloned()
			.collect::<Vec<_>>();

		let new_outputs = self
			.outputs
			.iter()
			.filter(|out| !to_cut_through.contains(&out.commitment()))
			.cloned()
			.collect::<Vec<_>>();

		TransactionBody {
			inputs: new_inputs,
			outputs: new_outputs,
			kernels: self.kernels,
		}
	}

	/// "Lightweight" validation that we can perform quickly during read/deserialization.
	/// Subset of full validation that skips expensive verification steps,
	/// specifically range proofs and kernel signature verification.
	pub fn validate_read(&self, weighting: Weighting) -> Result<(), Error> {
		self.verify_weight(weighting)?;
		self.verify_sorted()?;

		// Consensus rule that a transaction must have had cut-through
		// performed. A block is an aggregation and a commitment may
		// legitimately show up on both sides there.
		if weighting == Weighting::AsTransaction {
			self.verify_cut_through()?;
		}

		Ok(())
	}

	/// Validates all relevant parts of a transaction body. Checks the
	/// structure against consensus rules and then the range proofs of all
	/// outputs and the signatures of all kernels, batched and filtered
	/// through the verifier cache so already proven items are not reproven.
	pub fn validate(
		&self,
		weighting: Weighting,
		verifier: Arc<RwLock<dyn VerifierCache>>,
	) -> Result<(), Error> {
		self.validate_read(weighting)?;

		// Find all the outputs that have not had their rangeproofs verified.
		let outputs = {
			let mut verifier = verifier.write();
			verifier.filter_rangeproof_unverified(&self.outputs)
		};

		// Now batch verify all those unverified rangeproofs
		if !outputs.is_empty() {
			let mut commits = vec![];
			let mut proofs = vec![];
			for x in &outputs {
				commits.push(x.commit);
				proofs.push(x.proof);
			}
			Output::batch_verify_proofs(&commits, &proofs)?;
		}

		// Find all the kernels that have not yet been verified.
		let kernels = {
			let mut verifier = verifier.write();
			verifier.filter_kernel_sig_unverified(&self.kernels)
		};

		// Verify the unverified tx kernels.
		if !kernels.is_empty() {
			TxKernel::batch_sig_verify(&kernels)?;
		}

		// Cache the successful verification results for the new outputs and kernels.
		{
			let mut verifier = verifier.write();
			verifier.add_rangeproof_verified(outputs);
			verifier.add_kernel_sig_verified(kernels);
		}
		Ok(())
	}
}

/// A transaction
#[derive(Debug, Clone)]
pub struct Transaction {
	/// The kernel "offset" k2
	/// excess is k1G after splitting the key k = k1 + k2
	pub offset: BlindingFactor,
	/// The transaction body - inputs/outputs/kernels
	pub body: TransactionBody,
}

/// Implementation of Writeable for a fully blinded transaction, defines how to
/// write the transaction as binary.
impl Writeable for Transaction {
	fn write<W: Writer>(&self, writer: &mut W) -> Result<(), ser::Error> {
		self.offset.write(writer)?;
		self.body.write(writer)?;
		Ok(())
	}
}

/// Implementation of Readable for a transaction, defines how to read a full
/// transaction from a binary stream.
impl Readable for Transaction {
	fn read<R: Reader>(reader: &mut R) -> Result<Transaction, ser::Error> {
		let offset = BlindingFactor::read(reader)?;
		let body = TransactionBody::read(reader)?;
		Ok(Transaction { offset, body })
	}
}

impl Committed for Transaction {
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

impl Default for Transaction {
	fn default() -> Transaction {
		Transaction::empty()
	}
}

impl Transaction {
	/// Creates a new empty transaction (no inputs or outputs, zero fee).
	pub fn empty() -> Transaction {
		Transaction {
			offset: BlindingFactor::zero(),
			body: TransactionBody::empty(),
		}
	}

	/// Creates a new transaction initialized with
	/// the provided inputs, outputs, kernels
	pub fn new(
		inputs: Vec<Input>,
		outputs: Vec<Output>,
		kernels: Vec<TxKernel>,
	) -> Result<Transaction, Error> {
		let body = TransactionBody::init(inputs, outputs, kernels, false)?;
		Ok(Transaction {
			offset: BlindingFactor::zero(),
			body,
		})
	}

	/// Creates a new transaction using this transaction as a template
	/// and with the specified offset.
	pub fn with_offset(self, offset: BlindingFactor) -> Transaction {
		Transaction { offset, ..self }
	}

	/// Builds a new transaction with the provided input added. Existing
	/// inputs, if any, are kept intact. Sort order is maintained.
	pub fn with_input(self, input: Input) -> Transaction {
		Transaction {
			body: self.body.with_input(input),
			..self
		}
	}

	/// Builds a new transaction with the provided output added. Existing
	/// outputs, if any, are kept intact. Sort order is maintained.
	pub fn with_output(self, output: Output) -> Transaction {
		Transaction {
			body: self.body.with_output(output),
			..self
		}
	}

	/// Builds a new transaction with the provided kernel added. Existing
	/// kernels, if any, are kept intact. Sort order is maintained.
	pub fn with_kernel(self, kernel: TxKernel) -> Transaction {
		Transaction {
			body: self.body.with_kernel(kernel),
			..self
		}
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

	/// Total fee for a transaction is the sum of fees of all kernels.
	pub fn fee(&self) -> u64 {
		self.body.fee()
	}

	/// Total overage across all kernels.
	pub fn overage(&self) -> i64 {
		self.fee() as i64
	}

	/// Lock height of a transaction is the max lock height of the kernels.
	pub fn lock_height(&self) -> u64 {
		self.body
			.kernels
			.iter()
			.fold(0, |acc, k| std::cmp::max(acc, k.lock_height))
	}

	/// Validates all relevant parts of a fully built transaction. Checks the
	/// excess value against the signature as well as range proofs for each
	/// output.
	pub fn validate(
		&self,
		weighting: Weighting,
		verifier: Arc<RwLock<dyn VerifierCache>>,
	) -> Result<(), Error> {
		self.body.validate(weighting, verifier)?;
		self.verify_kernel_sums(self.overage(), self.offset)?;
		Ok(())
	}
}

#[cfg(test)]
mod test {
	use super::*;
	use rand::thread_rng;
	use util::secp::key::SecretKey;

	#[test]
	fn test_kernel_ser_deser() {
		let secp = static_secp_instance();
		let commit = {
			let secp = secp.lock();
			let skey = SecretKey::new(&secp, &mut thread_rng());
			secp.commit(5, skey).unwrap()
		};

		// just some bytes for testing ser/deser
		let sig = Signature::from_raw_data(&[0; 64]).unwrap();

		let kernel = TxKernel {
			features: KernelFeatures::DEFAULT_KERNEL,
			lock_height: 0,
			excess: commit,
			excess_sig: sig,
			fee: 10,
		};

		let vec = crate::ser::ser_vec(&kernel).expect("serialized failed");
		let kernel2: TxKernel = crate::ser::deserialize(&mut &vec[..]).unwrap();
		assert_eq!(kernel2.features, KernelFeatures::DEFAULT_KERNEL);
		assert_eq!(kernel2.lock_height, 0);
		assert_eq!(kernel2.excess, commit);
		assert_eq!(kernel2.excess_sig, sig);
		assert_eq!(kernel2.fee, 10);

		// now check a kernel with lock_height serializes/deserializes correctly
		let kernel = TxKernel {
			features: KernelFeatures::HEIGHT_LOCKED,
			lock_height: 100,
			excess: commit,
			excess_sig: sig,
			fee: 10,
		};

		let vec = crate::ser::ser_vec(&kernel).expect("serialized failed");
		let kernel2: TxKernel = crate::ser::deserialize(&mut &vec[..]).unwrap();
		assert_eq!(kernel2.features, KernelFeatures::HEIGHT_LOCKED);
		assert_eq!(kernel2.lock_height, 100);
	}

	#[test]
	fn test_weights() {
		assert_eq!(TransactionBody::weight_by_iok(1, 2, 1), 1 + 2 * 21 + 3);
		let body = TransactionBody::empty();
		assert_eq!(body.weight(), 0);
		assert_eq!(body.validate_read(Weighting::AsBlock), Ok(()));
	}

	#[test]
	fn test_kernel_features_for_lock_height() {
		assert_eq!(kernel_features(0), KernelFeatures::DEFAULT_KERNEL);
		assert_eq!(kernel_features(100), KernelFeatures::HEIGHT_LOCKED);
	}
}
