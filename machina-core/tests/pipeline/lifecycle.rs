use std::collections::BTreeMap;

use machina_core::{
    action::{
        keys,
        lifecycle::{self, LifecycleAction},
        HookRegistry, Runner,
    },
    config::{MachineConfig, ProvisionerEntry, RunMode, SyncedFolder},
    machine::MachineState,
    MachinaError,
};
use machina_utils::PathLock;

use crate::support::{record, Log, MachineOptions, TestMachine};

//--------------------------------------------------------------------------------------------------
// Functions: Helpers
//--------------------------------------------------------------------------------------------------

fn full_config() -> MachineConfig {
    let mut synced_folders = BTreeMap::new();
    synced_folders.insert(
        "project".to_string(),
        SyncedFolder::builder()
            .host_path("/")
            .guest_path("/workspace")
            .build(),
    );

    MachineConfig::builder()
        .provider("fake")
        .box_name("base/linux")
        .hostname("web-1")
        .provisioners(vec![ProvisionerEntry::builder()
            .name("bootstrap")
            .kind("shell")
            .run(RunMode::Once)
            .build()])
        .synced_folders(synced_folders)
        .build()
}

//--------------------------------------------------------------------------------------------------
// Tests: Up
//--------------------------------------------------------------------------------------------------

#[test_log::test(tokio::test)]
async fn test_up_creates_boots_and_provisions() -> anyhow::Result<()> {
    let machine = TestMachine::new(MachineState::NotCreated, full_config())?;

    lifecycle::run(&Runner::new(), LifecycleAction::Up, machine.env()).await?;

    assert_eq!(
        machine.log.entries(),
        [
            "boxes:add:base/linux:catalog",
            "provider:create",
            "folders:fake:prepare:project",
            "provider:boot",
            "folders:fake:enable:project",
            "guest:change_host_name:web-1",
            "provision:bootstrap"
        ]
    );
    assert_eq!(machine.provider.state_now(), MachineState::Running);
    assert!(machine.machine.sentinel_path().exists());
    assert!(PathLock::try_acquire(machine.machine.lock_path()).is_ok());
    Ok(())
}

#[test_log::test(tokio::test)]
async fn test_up_twice_respects_the_sentinel() -> anyhow::Result<()> {
    let machine = TestMachine::new(MachineState::NotCreated, full_config())?;
    let runner = Runner::new();

    lifecycle::run(&runner, LifecycleAction::Up, machine.env()).await?;
    machine.provider.set_state(MachineState::PowerOff);
    lifecycle::run(&runner, LifecycleAction::Up, machine.env()).await?;

    assert_eq!(machine.log.count("provision:bootstrap"), 1);
    assert_eq!(machine.log.count("provider:create"), 1);
    assert_eq!(machine.log.count("provider:boot"), 2);
    Ok(())
}

#[test_log::test(tokio::test)]
async fn test_up_on_running_machine_only_reports() -> anyhow::Result<()> {
    let machine = TestMachine::new(MachineState::Running, MachineConfig::default())?;

    lifecycle::run(&Runner::new(), LifecycleAction::Up, machine.env()).await?;

    assert!(machine.log.entries().is_empty());
    assert!(machine.ui.said("machine is already running"));
    Ok(())
}

#[test_log::test(tokio::test)]
async fn test_up_fails_while_another_action_holds_the_machine_lock() -> anyhow::Result<()> {
    let machine = TestMachine::new(MachineState::PowerOff, MachineConfig::default())?;
    let _held = PathLock::try_acquire(machine.machine.lock_path())?;

    let result = lifecycle::run(&Runner::new(), LifecycleAction::Up, machine.env()).await;

    assert!(matches!(result, Err(MachinaError::LockContended(_))));
    assert!(!machine.log.contains("provider:boot"));
    Ok(())
}

#[test_log::test(tokio::test)]
async fn test_failed_boot_destroys_the_new_machine() -> anyhow::Result<()> {
    let machine = TestMachine::with_options(
        MachineOptions {
            boot_state: MachineState::Aborted,
            ready: false,
            ..Default::default()
        },
        MachineConfig::default(),
    )?;

    let result = lifecycle::run(&Runner::new(), LifecycleAction::Up, machine.env()).await;

    assert!(matches!(result, Err(MachinaError::BootBadState { .. })));
    assert_eq!(
        machine.log.entries(),
        ["provider:create", "provider:boot", "provider:destroy"]
    );
    assert_eq!(machine.provider.state_now(), MachineState::NotCreated);
    Ok(())
}

#[test_log::test(tokio::test)]
async fn test_up_applies_hooks_registered_for_the_action() -> anyhow::Result<()> {
    let machine = TestMachine::new(MachineState::Running, MachineConfig::default())?;
    let log = Log::default();
    let hook_log = log.clone();

    let mut hooks = HookRegistry::new();
    hooks.register(lifecycle::UP, move |hook| {
        hook.append(record("plugin", &hook_log));
    });

    lifecycle::run(
        &Runner::new().with_hooks(hooks),
        LifecycleAction::Up,
        machine.env(),
    )
    .await?;

    assert!(log.contains("plugin:out"));
    Ok(())
}

//--------------------------------------------------------------------------------------------------
// Tests: Halt
//--------------------------------------------------------------------------------------------------

#[test_log::test(tokio::test)]
async fn test_halt_gracefully() -> anyhow::Result<()> {
    let machine = TestMachine::new(MachineState::Running, MachineConfig::default())?;

    lifecycle::run(&Runner::new(), LifecycleAction::Halt, machine.env()).await?;

    assert_eq!(machine.log.entries(), ["provider:halt"]);
    assert_eq!(machine.provider.state_now(), MachineState::PowerOff);
    Ok(())
}

#[test_log::test(tokio::test)]
async fn test_halt_forces_a_stubborn_machine() -> anyhow::Result<()> {
    let machine = TestMachine::with_options(
        MachineOptions {
            state: MachineState::Running,
            stubborn: true,
            ..Default::default()
        },
        MachineConfig::default(),
    )?;

    lifecycle::run(&Runner::new(), LifecycleAction::Halt, machine.env()).await?;

    assert_eq!(
        machine.log.entries(),
        ["provider:halt", "provider:halt:force"]
    );
    Ok(())
}

#[test_log::test(tokio::test)]
async fn test_halt_of_halted_and_missing_machines() -> anyhow::Result<()> {
    let machine = TestMachine::new(MachineState::PowerOff, MachineConfig::default())?;
    lifecycle::run(&Runner::new(), LifecycleAction::Halt, machine.env()).await?;
    assert!(machine.ui.said("machine is already halted"));

    let machine = TestMachine::new(MachineState::NotCreated, MachineConfig::default())?;
    let result = lifecycle::run(&Runner::new(), LifecycleAction::Halt, machine.env()).await;
    assert!(matches!(result, Err(MachinaError::MachineNotCreated(_))));
    Ok(())
}

//--------------------------------------------------------------------------------------------------
// Tests: Destroy
//--------------------------------------------------------------------------------------------------

#[test_log::test(tokio::test)]
async fn test_destroy_with_force_halts_cleans_up_and_destroys() -> anyhow::Result<()> {
    let machine = TestMachine::new(MachineState::Running, full_config())?;

    lifecycle::run(
        &Runner::new(),
        LifecycleAction::Destroy,
        machine.env().with(keys::FORCE_CONFIRM_DESTROY, true),
    )
    .await?;

    assert_eq!(
        machine.log.entries(),
        [
            "provider:halt:force",
            "cleanup:bootstrap",
            "provider:destroy"
        ]
    );
    assert_eq!(machine.machine.id(), None);
    Ok(())
}

#[test_log::test(tokio::test)]
async fn test_destroy_asks_first() -> anyhow::Result<()> {
    let machine = TestMachine::new(MachineState::PowerOff, MachineConfig::default())?;

    machine.ui.add_answers(&["n"]);
    lifecycle::run(&Runner::new(), LifecycleAction::Destroy, machine.env()).await?;
    assert!(machine.log.entries().is_empty());
    assert!(machine.ui.said("machine will not be destroyed"));

    machine.ui.add_answers(&["y"]);
    lifecycle::run(&Runner::new(), LifecycleAction::Destroy, machine.env()).await?;
    assert_eq!(machine.log.entries(), ["provider:destroy"]);
    Ok(())
}

#[test_log::test(tokio::test)]
async fn test_destroy_of_missing_machine_only_reports() -> anyhow::Result<()> {
    let machine = TestMachine::new(MachineState::NotCreated, MachineConfig::default())?;

    lifecycle::run(&Runner::new(), LifecycleAction::Destroy, machine.env()).await?;

    assert!(machine.ui.said("machine is not created"));
    assert!(machine.log.entries().is_empty());
    Ok(())
}

//--------------------------------------------------------------------------------------------------
// Tests: Provision
//--------------------------------------------------------------------------------------------------

#[test_log::test(tokio::test)]
async fn test_provision_requires_a_running_machine() -> anyhow::Result<()> {
    let machine = TestMachine::new(MachineState::PowerOff, full_config())?;
    let result = lifecycle::run(&Runner::new(), LifecycleAction::Provision, machine.env()).await;
    assert!(matches!(result, Err(MachinaError::MachineNotRunning(_))));

    machine.provider.set_state(MachineState::Running);
    lifecycle::run(&Runner::new(), LifecycleAction::Provision, machine.env()).await?;
    lifecycle::run(&Runner::new(), LifecycleAction::Provision, machine.env()).await?;

    assert_eq!(machine.log.count("provision:bootstrap"), 2);
    Ok(())
}
