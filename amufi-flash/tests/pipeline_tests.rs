//! End-to-end pipeline behavior against the recording FakeHal and a
//! tmpdir-backed fake device tree.

use amufi_flash::cli::{AgentKind, Cli};
use amufi_flash::config::ProvisioningConfig;
use amufi_flash::errors::FlashError;
use amufi_flash::pipeline;
use amufi_hal::{FakeHal, Operation};
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

struct Fixture {
    _dir: TempDir,
    dev: PathBuf,
    image: PathBuf,
    config: ProvisioningConfig,
}

fn fixture(device_size: u64) -> Fixture {
    let dir = TempDir::new().unwrap();
    let dev = dir.path().join("sdz");
    let file = fs::File::create(&dev).unwrap();
    file.set_len(device_size).unwrap();

    let image = dir.path().join("amufi.img");
    fs::write(&image, vec![0xAAu8; 2048]).unwrap();

    let mountpoint = dir.path().join("mnt");
    seed_system_root(&mountpoint);

    let mut config = ProvisioningConfig::default();
    config.mountpoint = mountpoint;
    config.image = image.clone();

    Fixture {
        _dir: dir,
        dev,
        image,
        config,
    }
}

/// The tree a freshly flashed system image would expose once mounted.
fn seed_system_root(root: &Path) {
    fs::create_dir_all(root.join("etc/network")).unwrap();
    fs::write(root.join("etc/hostname"), "amufi-blank\n").unwrap();
    fs::write(
        root.join("etc/hosts"),
        "127.0.0.1\tlocalhost\n127.0.1.1\tamufi-blank\n",
    )
    .unwrap();
    fs::write(
        root.join("etc/network/interfaces"),
        "auto eth0\niface eth0 inet static\naddress 10.0.200.1\nnetmask 255.255.255.0\n",
    )
    .unwrap();
}

fn cli_for(dev: &Path) -> Cli {
    Cli {
        dev: dev.to_path_buf(),
        partition: false,
        format: false,
        copy_image: false,
        number: None,
        image: None,
        agent: None,
        force: false,
        verbose: false,
        size: false,
        cardreader: false,
        config: None,
    }
}

fn no_confirmation(reason: &str) -> bool {
    panic!("unexpected confirmation prompt: {}", reason);
}

#[test]
fn full_run_executes_steps_in_fixed_order() {
    let fx = fixture(15_728_640_000);
    let mut cli = cli_for(&fx.dev);
    cli.partition = true;
    cli.format = true;
    cli.copy_image = true;
    cli.number = Some("07".to_string());

    let hal = FakeHal::new();
    let mut confirm = no_confirmation;
    pipeline::run(&hal, &cli, &fx.config, &mut confirm).unwrap();

    let ops = hal.operations();
    let position = |pred: &dyn Fn(&Operation) -> bool| ops.iter().position(|op| pred(op)).unwrap();

    let first_parted = position(&|op| matches!(op, Operation::Parted { .. }));
    let first_format = position(&|op| matches!(op, Operation::FormatExt4 { .. }));
    let copy = position(&|op| matches!(op, Operation::CopyImage { .. }));
    let mount = position(&|op| matches!(op, Operation::Mount { .. }));
    let unmount = position(&|op| matches!(op, Operation::Unmount { .. }));

    assert!(first_parted < first_format);
    assert!(first_format < copy);
    assert!(copy < mount);
    assert!(mount < unmount);

    // Region 1 = 4096 MiB starting at the 4 MiB alignment boundary.
    let parted_ops: Vec<String> = ops
        .iter()
        .filter_map(|op| match op {
            Operation::Parted { op, .. } => Some(op.clone()),
            _ => None,
        })
        .collect();
    assert_eq!(parted_ops.len(), 3);
    assert!(parted_ops[1].contains("4100MiB"));
    assert!(parted_ops[2].contains("100%"));

    // Both regions formatted with the configured labels.
    let labels: Vec<String> = ops
        .iter()
        .filter_map(|op| match op {
            Operation::FormatExt4 { label, .. } => Some(label.clone()),
            _ => None,
        })
        .collect();
    assert_eq!(labels, vec!["system".to_string(), "data".to_string()]);

    // Image copied onto partition 1 of the device.
    assert!(hal.has_operation(|op| matches!(
        op,
        Operation::CopyImage { image, target, .. }
            if image == &fx.image && target.to_string_lossy().ends_with("sdz1")
    )));

    // Identity stamped through the mount point.
    let hostname = fs::read_to_string(fx.config.mountpoint.join("etc/hostname")).unwrap();
    assert_eq!(hostname, "aMussel07\n");

    let hosts = fs::read_to_string(fx.config.mountpoint.join("etc/hosts")).unwrap();
    assert!(hosts.contains("127.0.1.1   aMussel07\n"));
    assert!(hosts.contains("127.0.0.1\tlocalhost\n"));

    let interfaces =
        fs::read_to_string(fx.config.mountpoint.join("etc/network/interfaces")).unwrap();
    assert!(interfaces.contains("address 10.0.200.07\n"));
}

#[test]
fn declining_a_size_warning_stops_before_any_destructive_call() {
    // Wrong size: the gate must warn, and "no" must behave like a failure.
    let fx = fixture(1_000_000_000);
    let mut cli = cli_for(&fx.dev);
    cli.partition = true;
    cli.format = true;

    let hal = FakeHal::new();
    let mut decline = |reason: &str| {
        assert!(reason.contains("size mismatch"));
        false
    };
    let err = pipeline::run(&hal, &cli, &fx.config, &mut decline).unwrap_err();

    assert!(matches!(err, FlashError::ConfirmationDeclined));
    assert_eq!(hal.destructive_operation_count(), 0);
}

#[test]
fn accepting_a_size_warning_continues_the_run() {
    let fx = fixture(1_000_000_000);
    let mut cli = cli_for(&fx.dev);
    cli.partition = true;

    let hal = FakeHal::new();
    let mut accept = |_: &str| true;
    pipeline::run(&hal, &cli, &fx.config, &mut accept).unwrap();

    assert!(hal.has_operation(|op| matches!(op, Operation::Parted { .. })));
}

#[test]
fn missing_image_aborts_before_any_partition_format_or_copy_call() {
    let fx = fixture(15_728_640_000);
    let mut cli = cli_for(&fx.dev);
    cli.partition = true;
    cli.format = true;
    cli.copy_image = true;
    cli.image = Some(PathBuf::from("/nonexistent/amufi.img"));

    let hal = FakeHal::new();
    let mut confirm = no_confirmation;
    let err = pipeline::run(&hal, &cli, &fx.config, &mut confirm).unwrap_err();

    assert!(matches!(err, FlashError::Validation(_)));
    assert_eq!(hal.destructive_operation_count(), 0);
    assert!(!hal.has_operation(|op| matches!(op, Operation::Mount { .. })));
}

#[test]
fn force_skips_the_gate_entirely() {
    // Wrong size would normally prompt; with --force nothing may ask.
    let fx = fixture(1_000_000_000);
    let mut cli = cli_for(&fx.dev);
    cli.partition = true;
    cli.force = true;

    let hal = FakeHal::new();
    let mut confirm = no_confirmation;
    pipeline::run(&hal, &cli, &fx.config, &mut confirm).unwrap();

    assert!(hal.has_operation(|op| matches!(op, Operation::Parted { .. })));
}

#[test]
fn cardreader_flag_switches_the_partition_naming_convention() {
    let fx = fixture(15_728_640_000);
    let mut cli = cli_for(&fx.dev);
    cli.format = true;
    cli.cardreader = true;

    let hal = FakeHal::new();
    let mut confirm = no_confirmation;
    pipeline::run(&hal, &cli, &fx.config, &mut confirm).unwrap();

    let formatted: Vec<String> = hal
        .operations()
        .iter()
        .filter_map(|op| match op {
            Operation::FormatExt4 { device, .. } => Some(device.display().to_string()),
            _ => None,
        })
        .collect();
    assert!(formatted[0].ends_with("sdzp1"));
    assert!(formatted[1].ends_with("sdzp2"));
}

#[test]
fn agent_flag_selects_the_hostname_prefix() {
    let fx = fixture(15_728_640_000);
    let mut cli = cli_for(&fx.dev);
    cli.number = Some("12".to_string());
    cli.agent = Some(AgentKind::AFish);

    let hal = FakeHal::new();
    let mut confirm = no_confirmation;
    pipeline::run(&hal, &cli, &fx.config, &mut confirm).unwrap();

    let hostname = fs::read_to_string(fx.config.mountpoint.join("etc/hostname")).unwrap();
    assert_eq!(hostname, "aFish12\n");
    let hosts = fs::read_to_string(fx.config.mountpoint.join("etc/hosts")).unwrap();
    assert!(hosts.contains("127.0.1.1   aFish12\n"));
}
