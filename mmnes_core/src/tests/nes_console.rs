use std::cell::RefCell;
use std::rc::Rc;
use crate::controller::{BUTTON_PRESSED, BUTTON_RELEASED, NES_CONTROLLER_KEY_SELECT};
use crate::cpu::CpuError;
use crate::loader::LoaderError;
use crate::nes_console::{NESConsole, NESConsoleBuilder, NESConsoleError};
use crate::tests::{build_nrom_image, demo_rom, init, DEMO_MAIN_LOOP_COUNTER, DEMO_NMI_COUNTER};

fn create_console() -> NESConsole {
    init();
    NESConsoleBuilder::new().build()
}

fn create_demo_console() -> NESConsole {
    let mut console = create_console();
    console.load_rom(&demo_rom()).unwrap();
    console
}

#[test]
fn stepping_without_cartridge_fails() {
    let mut console = create_console();

    assert!(!console.is_cartridge_loaded());
    assert_eq!(console.step_frame(), Err(NESConsoleError::NoCartridge));
    assert_eq!(console.reset(), Err(NESConsoleError::NoCartridge));
}

#[test]
fn invalid_image_is_reported_as_loader_error() {
    let mut console = create_console();

    let result = console.load_rom(b"not a rom");

    assert_eq!(result, Err(NESConsoleError::ProgramLoaderError(LoaderError::InvalidRomFormat)));
    assert!(!console.is_cartridge_loaded());
}

#[test]
fn loading_powers_on_at_the_reset_vector() {
    let console = create_demo_console();

    let registers = console.cpu_registers();
    assert_eq!(registers.pc, 0xC000);
    assert_eq!(registers.sp, 0xFD);
    assert_eq!(registers.p, 0x24);
    assert_eq!(console.frame_count(), 0);
}

#[test]
fn each_frame_runs_one_nmi_and_notifies_the_frame_callback() {
    init();
    let frames = Rc::new(RefCell::new(Vec::new()));
    let frames_sink = frames.clone();
    let mut console = NESConsoleBuilder::new()
        .with_frame_callback(Box::new(move |frame| frames_sink.borrow_mut().push(frame)))
        .build();
    console.load_rom(&demo_rom()).unwrap();

    for expected in 1..=3 {
        assert_eq!(console.step_frame().unwrap(), expected);
    }

    assert_eq!(*frames.borrow(), vec![1, 2, 3]);
    assert_eq!(console.peek(DEMO_NMI_COUNTER), 3);
    assert_ne!(console.peek(DEMO_MAIN_LOOP_COUNTER), 0);
    assert!(console.ppu_flags().nmi_on_vblank);
    assert!(console.ppu_flags().bg_visible);
}

#[test]
fn a_frame_emits_about_eight_hundred_identical_stereo_samples() {
    init();
    let samples = Rc::new(RefCell::new(Vec::new()));
    let samples_sink = samples.clone();
    let mut console = NESConsoleBuilder::new()
        .with_sample_rate(48_000)
        .with_audio_sample_callback(Box::new(move |left, right| samples_sink.borrow_mut().push((left, right))))
        .build();
    console.load_rom(&demo_rom()).unwrap();

    console.step_frame().unwrap();
    console.step_frame().unwrap();

    let samples = samples.borrow();
    assert!((1400..=1800).contains(&samples.len()), "got {} samples", samples.len());
    assert!(samples.iter().all(|(left, right)| left == right));
    assert!(samples.iter().any(|(left, _)| left.abs() > 0.01));
}

#[test]
fn reset_restarts_the_program() {
    let mut console = create_demo_console();
    console.step_frame().unwrap();
    console.step_frame().unwrap();
    assert_eq!(console.peek(DEMO_NMI_COUNTER), 2);

    console.reset().unwrap();

    assert_eq!(console.cpu_registers().pc, 0xC000);
    assert_eq!(console.peek(DEMO_NMI_COUNTER), 0);
    assert_eq!(console.frame_count(), 0);
}

#[test]
fn two_consoles_fed_the_same_rom_stay_in_lockstep() {
    let mut first = create_demo_console();
    let mut second = create_demo_console();

    for _ in 0..5 {
        first.step_frame().unwrap();
        second.step_frame().unwrap();
    }

    assert_eq!(first.cpu_registers(), second.cpu_registers());
    for addr in 0..0x0800u16 {
        assert_eq!(first.peek(addr), second.peek(addr));
    }
}

#[test]
fn jammed_cpu_surfaces_as_cpu_error() {
    let mut console = create_console();
    console.load_rom(&build_nrom_image(&[0x02], 0xC000)).unwrap();

    assert_eq!(console.step_frame(), Err(NESConsoleError::CpuError(CpuError::Halted(0xC000))));
}

#[test]
fn buttons_are_tracked_per_controller() {
    let mut console = create_demo_console();

    console.button_down(1, NES_CONTROLLER_KEY_SELECT).unwrap();

    assert_eq!(console.controller_state(1).unwrap()[NES_CONTROLLER_KEY_SELECT], BUTTON_PRESSED);
    assert_eq!(console.controller_state(0).unwrap()[NES_CONTROLLER_KEY_SELECT], BUTTON_RELEASED);

    console.button_up(1, NES_CONTROLLER_KEY_SELECT).unwrap();
    assert_eq!(console.controller_state(1).unwrap()[NES_CONTROLLER_KEY_SELECT], BUTTON_RELEASED);
}

#[test]
fn unknown_controller_port_is_rejected() {
    let mut console = create_demo_console();

    assert!(matches!(console.button_down(2, 0), Err(NESConsoleError::ControllerError(_))));
    assert!(console.controller_state(2).is_err());
}
