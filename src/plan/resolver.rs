// ABOUTME: Pure resolution of a descriptor into an ordered plan.
// ABOUTME: Validates slots, merges fragments and synthesizes the implicit network.

use super::descriptor::{Account, Capability, Descriptor, Fragment, PortBinding, Slot};
use super::error::{ResolveError, Result};
use super::spec::{ContainerSpec, Dependency, ImageSource, NetworkSpec, Plan};
use super::template::EnvSnapshot;
use crate::config::HealthCheck;
use crate::types::{ImageRef, SlotName};
use std::collections::{BTreeMap, HashSet};
use std::path::PathBuf;

/// Slot name used for the network when none is declared.
pub const IMPLICIT_NETWORK_SLOT: &str = "network";

/// Environment variable carrying seeded accounts for file-transfer slots.
pub const SFTP_USERS_VAR: &str = "SFTP_USERS";

/// Resolve a descriptor against a frozen environment snapshot.
///
/// Runs no I/O; a failure here means nothing was created.
pub fn resolve(descriptor: &Descriptor, env: &EnvSnapshot) -> Result<Plan> {
    let mut seen = HashSet::new();
    let mut named = Vec::with_capacity(descriptor.slots.len());
    for slot in &descriptor.slots {
        let name = SlotName::new(&slot.name).map_err(|source| ResolveError::InvalidSlotName {
            name: slot.name.clone(),
            source,
        })?;
        if !seen.insert(name.clone()) {
            return Err(ResolveError::ambiguous(
                name.as_str(),
                "slot name is declared more than once",
            ));
        }
        named.push((name, slot));
    }

    let mut network_slots = named
        .iter()
        .filter(|(_, slot)| slot.capability == Capability::Network);
    let declared_network = network_slots.next();
    if let Some((extra, _)) = network_slots.next() {
        return Err(ResolveError::ambiguous(
            extra.as_str(),
            "only one network slot may be declared",
        ));
    }

    let network = match declared_network {
        Some((name, slot)) => resolve_network(descriptor, name.clone(), slot, env)?,
        None => {
            let name = SlotName::new(IMPLICIT_NETWORK_SLOT).map_err(|source| {
                ResolveError::InvalidSlotName {
                    name: IMPLICIT_NETWORK_SLOT.to_string(),
                    source,
                }
            })?;
            if seen.contains(&name) {
                return Err(ResolveError::ambiguous(
                    IMPLICIT_NETWORK_SLOT,
                    "name is reserved for the implicit environment network",
                ));
            }
            NetworkSpec {
                identity: default_identity(&descriptor.name, &name),
                slot: name,
                options: BTreeMap::new(),
                implicit: true,
            }
        }
    };

    let mut containers = Vec::new();
    let mut dependencies = Vec::new();
    for (name, slot) in &named {
        if slot.capability == Capability::Network {
            continue;
        }
        let spec = resolve_container(descriptor, name.clone(), slot, &network.slot, env)?;
        if let Some(network) = &spec.network {
            dependencies.push(Dependency::JoinsNetwork {
                container: spec.slot.clone(),
                network: network.clone(),
            });
        }
        if let ImageSource::Build { context, .. } = &spec.source {
            dependencies.push(Dependency::BuildsFrom {
                container: spec.slot.clone(),
                context: context.clone(),
            });
        }
        containers.push(spec);
    }

    Ok(Plan::new(
        descriptor.name.clone(),
        network,
        containers,
        dependencies,
    ))
}

fn default_identity(environment: &str, slot: &SlotName) -> String {
    format!("{environment}-{slot}")
}

/// Make a rendered identity usable as a runtime name prefix.
///
/// Runtime names must start with an alphanumeric and hold only
/// `[a-zA-Z0-9_.-]`. Other characters become `-`, leading and trailing
/// separators are dropped, and an identity that renders empty falls back
/// to the default.
fn runtime_identity(rendered: Option<String>, environment: &str, slot: &SlotName) -> String {
    let cleaned = rendered.map(|value| {
        value
            .chars()
            .map(|c| {
                if c.is_ascii_alphanumeric() || "-_.".contains(c) {
                    c
                } else {
                    '-'
                }
            })
            .collect::<String>()
    });
    match cleaned
        .as_deref()
        .map(|value| value.trim_matches(|c: char| !c.is_ascii_alphanumeric()))
    {
        Some(identity) if !identity.is_empty() => identity.to_string(),
        _ => default_identity(environment, slot),
    }
}

/// Lowercase and replace anything an image name cannot hold.
fn image_name_component(value: &str) -> String {
    value
        .to_ascii_lowercase()
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || "-_.".contains(c) {
                c
            } else {
                '-'
            }
        })
        .collect()
}

fn resolve_network(
    descriptor: &Descriptor,
    name: SlotName,
    slot: &Slot,
    env: &EnvSnapshot,
) -> Result<NetworkSpec> {
    let mut identity = None;
    let mut options = BTreeMap::new();
    for fragment in &slot.fragments {
        match fragment {
            Fragment::Identity(template) => {
                set_once(&mut identity, env.render(template), &name, "identity")?
            }
            Fragment::Option(setting) => {
                insert_setting(&mut options, &setting.key, setting.value.clone(), &name, "option")?
            }
            other => {
                return Err(ResolveError::ambiguous(
                    name.as_str(),
                    format!("'{}' is not valid on a network slot", other.kind()),
                ));
            }
        }
    }

    Ok(NetworkSpec {
        identity: runtime_identity(identity, &descriptor.name, &name),
        slot: name,
        options,
        implicit: false,
    })
}

#[derive(Default)]
struct ContainerFragments {
    identity: Option<String>,
    image: Option<String>,
    build: Option<(PathBuf, PathBuf)>,
    command: Option<Vec<String>>,
    healthcheck: Option<HealthCheck>,
    isolated: Option<bool>,
    ports: Vec<PortBinding>,
    accounts: Vec<Account>,
    env: BTreeMap<String, String>,
    options: BTreeMap<String, String>,
}

fn collect_fragments(
    name: &SlotName,
    slot: &Slot,
    env: &EnvSnapshot,
) -> Result<ContainerFragments> {
    let mut acc = ContainerFragments::default();
    for fragment in &slot.fragments {
        match fragment {
            Fragment::Identity(template) => {
                set_once(&mut acc.identity, env.render(template), name, "identity")?
            }
            Fragment::Image(reference) => set_once(&mut acc.image, reference.clone(), name, "image")?,
            Fragment::Build(build) => set_once(
                &mut acc.build,
                (build.context.clone(), build.dockerfile.clone()),
                name,
                "build",
            )?,
            Fragment::Command(args) => set_once(&mut acc.command, args.clone(), name, "command")?,
            Fragment::HealthCheck(hc) => {
                set_once(&mut acc.healthcheck, hc.clone(), name, "health_check")?
            }
            Fragment::Isolated(isolated) => set_once(&mut acc.isolated, *isolated, name, "isolated")?,
            Fragment::Port(binding) => {
                if acc.ports.iter().any(|p| {
                    p.container_port == binding.container_port && p.protocol == binding.protocol
                }) {
                    return Err(ResolveError::ambiguous(
                        name.as_str(),
                        format!(
                            "port {}/{} is declared more than once",
                            binding.container_port, binding.protocol
                        ),
                    ));
                }
                acc.ports.push(*binding);
            }
            Fragment::Account(account) => acc.accounts.push(account.clone()),
            Fragment::Env(setting) => insert_setting(
                &mut acc.env,
                &setting.key,
                env.render(&setting.value),
                name,
                "env",
            )?,
            Fragment::Option(setting) => insert_setting(
                &mut acc.options,
                &setting.key,
                setting.value.clone(),
                name,
                "option",
            )?,
        }
    }
    Ok(acc)
}

fn resolve_container(
    descriptor: &Descriptor,
    name: SlotName,
    slot: &Slot,
    network: &SlotName,
    env: &EnvSnapshot,
) -> Result<ContainerSpec> {
    let mut acc = collect_fragments(&name, slot, env)?;

    let source = match (acc.image.take(), acc.build.take()) {
        (Some(_), Some(_)) => {
            return Err(ResolveError::ambiguous(
                name.as_str(),
                "both 'image' and 'build' are declared",
            ));
        }
        (Some(reference), None) => {
            ImageSource::Image(ImageRef::parse(&reference).map_err(|source| {
                ResolveError::InvalidImage {
                    slot: name.to_string(),
                    source,
                }
            })?)
        }
        (None, Some((context, dockerfile))) => ImageSource::Build {
            context,
            dockerfile,
            tag: ImageRef::local(
                &format!(
                    "testbed/{}-{}",
                    image_name_component(&descriptor.name),
                    name
                ),
                "latest",
            ),
        },
        (None, None) => {
            return Err(ResolveError::unresolvable(
                name.as_str(),
                "neither 'image' nor 'build' is declared",
            ));
        }
    };

    match slot.capability {
        Capability::FileTransfer => {
            if acc.accounts.is_empty() {
                return Err(ResolveError::unresolvable(
                    name.as_str(),
                    "file-transfer slots need at least one account",
                ));
            }
            let users = acc
                .accounts
                .iter()
                .map(|a| format!("{}:{}:::upload", a.username, a.credential))
                .collect::<Vec<_>>()
                .join(" ");
            insert_setting(&mut acc.env, SFTP_USERS_VAR, users, &name, "env")?;
        }
        Capability::Http if acc.ports.is_empty() => {
            return Err(ResolveError::unresolvable(
                name.as_str(),
                "http slots need at least one port",
            ));
        }
        _ => {}
    }

    let joined = (!acc.isolated.unwrap_or(false)).then(|| network.clone());

    Ok(ContainerSpec {
        identity: runtime_identity(acc.identity, &descriptor.name, &name),
        slot: name,
        capability: slot.capability,
        source,
        ports: acc.ports,
        accounts: acc.accounts,
        env: acc.env,
        command: acc.command,
        healthcheck: acc.healthcheck,
        options: acc.options,
        network: joined,
    })
}

fn set_once<T>(slot: &mut Option<T>, value: T, name: &SlotName, kind: &str) -> Result<()> {
    if slot.is_some() {
        return Err(ResolveError::ambiguous(
            name.as_str(),
            format!("'{kind}' is declared more than once"),
        ));
    }
    *slot = Some(value);
    Ok(())
}

/// Repeating a key is fine only with the same value.
fn insert_setting(
    map: &mut BTreeMap<String, String>,
    key: &str,
    value: String,
    name: &SlotName,
    kind: &str,
) -> Result<()> {
    match map.get(key) {
        Some(existing) if *existing != value => Err(ResolveError::ambiguous(
            name.as_str(),
            format!("{kind} '{key}' has conflicting values"),
        )),
        _ => {
            map.insert(key.to_string(), value);
            Ok(())
        }
    }
}
