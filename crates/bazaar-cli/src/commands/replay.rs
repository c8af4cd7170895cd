//! Instruction script replay.
//!
//! A script names its signers as actors; each actor gets a development
//! keypair seeded from `blake3(name)` and an initial balance. Address fields
//! (`user`, `listing`, `purchase`) may use references instead of base58:
//!
//! | Reference | Resolves to |
//! |---|---|
//! | `@alice` | alice's identity |
//! | `@user:alice` | alice's user account |
//! | `@listing:alice:<title>` | alice's listing with that title |
//! | `@purchase:alice:<title>:bob` | bob's purchase of that listing |
//!
//! Actor names cannot contain `:`; titles can.
//!
//! ```json
//! { "steps": [
//!     { "actor": "admin", "instruction": { "type": "initialize_marketplace", "fee_rate": 250 } },
//!     { "actor": "bob", "instruction": { "type": "purchase_item", "listing": "@listing:alice:Bike" } }
//! ] }
//! ```

use std::collections::BTreeMap;
use std::fs;
use std::io::Write;
use std::path::Path;

use bazaar_core::{Address, Keypair};
use bazaar_core::address::{listing_address, purchase_address, user_address};
use bazaar_ledger::{InMemoryBank, Instruction, Ledger, ManualClock, SignedInstruction};
use serde::Deserialize;
use serde_json::Value;
use tracing::info;

use crate::cli::ReplayArgs;
use crate::config::BazaarConfig;
use crate::error::CliError;
use crate::output::{OutputFormat, ReplayReport, StepOutcome};

/// One scripted instruction.
#[derive(Debug, Clone, Deserialize)]
pub struct ScriptStep {
    /// Signing actor.
    pub actor: String,
    /// Instruction JSON, possibly with `@` references.
    pub instruction: Value,
}

/// A replay script.
#[derive(Debug, Clone, Deserialize)]
pub struct ReplayScript {
    /// Ledger time of the first step; each step advances it by one second.
    #[serde(default)]
    pub start_time: i64,
    /// Steps, in order.
    pub steps: Vec<ScriptStep>,
}

impl ReplayScript {
    /// Parses a script from JSON.
    ///
    /// # Errors
    ///
    /// Returns `CliError::Script` on malformed input.
    pub fn from_json(json: &str) -> Result<Self, CliError> {
        serde_json::from_str(json).map_err(|e| CliError::Script(e.to_string()))
    }

    /// Loads a script file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn load(path: &Path) -> Result<Self, CliError> {
        Self::from_json(&fs::read_to_string(path)?)
    }
}

/// The development keypair of actor `name`.
#[must_use]
pub fn actor_keypair(name: &str) -> Keypair {
    Keypair::from_seed(blake3::hash(name.as_bytes()).as_bytes())
}

/// Named development keypairs.
#[derive(Debug, Default)]
pub struct Actors {
    keys: BTreeMap<String, Keypair>,
}

impl Actors {
    /// The keypair of `name`, created on first use. Returns true as the second
    /// value when the actor is new.
    pub fn get_or_create(&mut self, name: &str) -> (&Keypair, bool) {
        let created = !self.keys.contains_key(name);
        let key = self
            .keys
            .entry(name.to_string())
            .or_insert_with(|| actor_keypair(name));
        (key, created)
    }
}

/// Instruction fields holding an account address.
const ADDRESS_FIELDS: [&str; 3] = ["user", "listing", "purchase"];

/// Replaces `@` references in the address fields of an instruction object
/// with base58 addresses. Other fields, free text included, are untouched.
///
/// # Errors
///
/// Returns `CliError::Script` on a malformed reference.
pub fn resolve_references(instruction: &mut Value) -> Result<(), CliError> {
    let Value::Object(fields) = instruction else {
        return Ok(());
    };
    for (key, value) in fields.iter_mut() {
        if !ADDRESS_FIELDS.contains(&key.as_str()) {
            continue;
        }
        if let Value::String(s) = value {
            if let Some(reference) = s.strip_prefix('@') {
                *s = resolve_reference(reference)?;
            }
        }
    }
    Ok(())
}

fn resolve_reference(reference: &str) -> Result<String, CliError> {
    let address = match reference.split_once(':') {
        None => Some(identity(reference)),
        Some(("user", name)) => Some(user_address(&identity(name)).0),
        Some(("listing", rest)) => listing_reference(rest),
        Some(("purchase", rest)) => rest.rsplit_once(':').and_then(|(listing, buyer)| {
            listing_reference(listing).map(|listing| purchase_address(&listing, &identity(buyer)).0)
        }),
        Some(_) => None,
    };
    address
        .map(|address| address.to_base58())
        .ok_or_else(|| CliError::Script(format!("unknown reference: @{reference}")))
}

fn identity(name: &str) -> Address {
    actor_keypair(name).address()
}

/// `seller:title`; the title runs to the end and may itself contain `:`.
fn listing_reference(reference: &str) -> Option<Address> {
    let (seller, title) = reference.split_once(':')?;
    Some(listing_address(&identity(seller), title).0)
}

/// Replay command executor.
#[derive(Debug)]
pub struct ReplayCommand<'a> {
    config: &'a BazaarConfig,
}

impl<'a> ReplayCommand<'a> {
    /// Create a new replay command.
    #[must_use]
    pub const fn new(config: &'a BazaarConfig) -> Self {
        Self { config }
    }

    /// Runs `script` against a fresh ledger.
    ///
    /// Rejected steps are reported, not fatal, unless `fail_fast` is set.
    ///
    /// # Errors
    ///
    /// Returns an error for malformed steps, or the first rejection when
    /// `fail_fast` is set.
    pub fn run(
        &self,
        script: &ReplayScript,
        fail_fast: bool,
    ) -> Result<(Ledger<InMemoryBank, ManualClock>, ReplayReport), CliError> {
        let ledger = Ledger::new(
            self.config.ledger_config(),
            InMemoryBank::new(),
            ManualClock::new(script.start_time),
        )?;
        let mut actors = Actors::default();
        let mut steps = Vec::with_capacity(script.steps.len());

        for (index, step) in script.steps.iter().enumerate() {
            let mut raw = step.instruction.clone();
            resolve_references(&mut raw)?;
            let instruction: Instruction = serde_json::from_value(raw)
                .map_err(|e| CliError::Script(format!("step {index}: {e}")))?;

            let (keypair, created) = actors.get_or_create(&step.actor);
            if created {
                ledger
                    .bank()
                    .fund(keypair.address(), self.config.ledger.initial_balance)
                    .map_err(bazaar_ledger::LedgerError::from)?;
            }
            let signed = SignedInstruction::sign(keypair, instruction)?;

            let outcome = match ledger.submit(&signed) {
                Ok(receipt) => StepOutcome {
                    step: index,
                    actor: step.actor.clone(),
                    instruction: receipt.instruction,
                    account: Some(receipt.account),
                    class: None,
                    error: None,
                },
                Err(e) if fail_fast => {
                    return Err(CliError::Script(format!("step {index} rejected: {e}")));
                }
                Err(e) => StepOutcome {
                    step: index,
                    actor: step.actor.clone(),
                    instruction: signed.instruction.name().to_string(),
                    account: None,
                    class: Some(e.class()),
                    error: Some(e.to_string()),
                },
            };
            steps.push(outcome);
            ledger.clock().advance(1);
        }

        let report = ReplayReport {
            marketplace: ledger.marketplace(),
            steps,
        };
        info!(
            steps = report.steps.len(),
            rejected = report.failures(),
            "replay finished"
        );
        Ok((ledger, report))
    }

    /// Runs the script file, writes the report and optionally the snapshot.
    ///
    /// # Errors
    ///
    /// Returns an error if the script cannot be loaded or run, or output fails.
    pub fn execute<W: Write>(
        &self,
        writer: &mut W,
        format: &OutputFormat,
        args: &ReplayArgs,
    ) -> Result<ReplayReport, CliError> {
        let script = ReplayScript::load(&args.script)?;
        let (ledger, report) = self.run(&script, args.fail_fast)?;
        if let Some(path) = &args.state {
            ledger.snapshot().save(path)?;
            info!(path = %path.display(), "snapshot written");
        }
        format.write(writer, &report)?;
        Ok(report)
    }
}
