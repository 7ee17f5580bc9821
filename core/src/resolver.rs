//! Turns config entries into validator and actor instances.
//!
//! Zero entries give the dummy, one entry gives that leaf, and several give a
//! composite built in listed order.

use crate::actors::{Actor, ActorKind, CompositeActor, DummyActor};
use crate::args::Arguments;
use crate::config::{ActorEntry, ValidatorEntry};
use crate::error::ConfigError;
use crate::target::Target;
use crate::validators::{
    CompositeCrossValidator, CompositeValidator, CrossValidator, CrossValidatorKind,
    DummyCrossValidator, DummyValidator, Validator, ValidatorKind,
};

fn build_validator(entry: &ValidatorEntry, target: Target) -> Result<Box<dyn Validator>, ConfigError> {
    let kind: ValidatorKind = entry.validator.parse()?;
    let validator = kind.configure(Arguments::new(&entry.validator, &entry.args, &entry.kwargs))?;
    if !validator.accepts().allows(target) {
        return Err(ConfigError::IncompatibleTarget {
            tag: entry.validator.clone(),
            target,
        });
    }
    Ok(validator)
}

pub fn configure_validator(
    entries: &[ValidatorEntry],
    target: Target,
) -> Result<Box<dyn Validator>, ConfigError> {
    match entries {
        [] => Ok(Box::new(DummyValidator)),
        [entry] => build_validator(entry, target),
        many => {
            let mut composite = CompositeValidator::new();
            for entry in many {
                composite.push(build_validator(entry, target)?);
            }
            Ok(Box::new(composite))
        }
    }
}

fn build_cross_validator(entry: &ValidatorEntry) -> Result<Box<dyn CrossValidator>, ConfigError> {
    let kind: CrossValidatorKind = entry.validator.parse()?;
    kind.configure(Arguments::new(&entry.validator, &entry.args, &entry.kwargs))
}

pub fn configure_cross_validator(entries: &[ValidatorEntry]) -> Result<Box<dyn CrossValidator>, ConfigError> {
    match entries {
        [] => Ok(Box::new(DummyCrossValidator)),
        [entry] => build_cross_validator(entry),
        many => {
            let mut composite = CompositeCrossValidator::new();
            for entry in many {
                composite.push(build_cross_validator(entry)?);
            }
            Ok(Box::new(composite))
        }
    }
}

async fn build_actor(entry: &ActorEntry, target: Target) -> Result<Box<dyn Actor>, ConfigError> {
    let kind: ActorKind = entry.actor.parse()?;
    // Checked before construction, which may create directories or clients.
    if !kind.accepts().allows(target) {
        return Err(ConfigError::IncompatibleTarget {
            tag: entry.actor.clone(),
            target,
        });
    }
    kind.configure(Arguments::new(&entry.actor, &entry.args, &entry.kwargs))
        .await
}

pub async fn configure_actor(entries: &[ActorEntry], target: Target) -> Result<Box<dyn Actor>, ConfigError> {
    match entries {
        [] => Ok(Box::new(DummyActor)),
        [entry] => build_actor(entry, target).await,
        many => {
            let mut composite = CompositeActor::new();
            for entry in many {
                composite.push(build_actor(entry, target).await?);
            }
            Ok(Box::new(composite))
        }
    }
}
