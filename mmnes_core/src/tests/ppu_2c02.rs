use std::cell::RefCell;
use std::rc::Rc;
use crate::cartridge::{Cartridge, ChrMemory, PpuNameTableMirroring};
use crate::nrom_cartridge::NromCartridge;
use crate::ppu_2c02::{Ppu2c02, DOTS_PER_SCANLINE, SCANLINES_PER_FRAME};
use crate::tests::{init, CHR_BANK_SIZE, PRG_BANK_SIZE};

const PPUCTRL: u16 = 0x2000;
const PPUMASK: u16 = 0x2001;
const PPUSTATUS: u16 = 0x2002;
const OAMADDR: u16 = 0x2003;
const OAMDATA: u16 = 0x2004;
const PPUSCROLL: u16 = 0x2005;
const PPUADDR: u16 = 0x2006;
const PPUDATA: u16 = 0x2007;

fn create_cartridge(mirroring: PpuNameTableMirroring) -> Rc<RefCell<dyn Cartridge>> {
    let cartridge = NromCartridge::new(vec![0; PRG_BANK_SIZE], ChrMemory::ram(CHR_BANK_SIZE), mirroring).unwrap();
    Rc::new(RefCell::new(cartridge))
}

fn create_ppu_with_nametable_mirroring(mirroring: PpuNameTableMirroring) -> Ppu2c02 {
    init();
    let mut ppu = Ppu2c02::new();
    ppu.insert_cartridge(create_cartridge(mirroring));
    ppu
}

fn create_ppu() -> Ppu2c02 {
    create_ppu_with_nametable_mirroring(PpuNameTableMirroring::Horizontal)
}

fn set_vram_address(ppu: &mut Ppu2c02, addr: u16) {
    ppu.write_register(PPUADDR, (addr >> 8) as u8);
    ppu.write_register(PPUADDR, addr as u8);
}

fn tick_until(ppu: &mut Ppu2c02, scanline: u16, dot: u16) {
    while ppu.scanline() != scanline || ppu.dot() != dot {
        ppu.tick();
    }
}

#[test]
fn vblank_starts_at_scanline_241_and_raises_nmi_when_enabled() {
    let mut ppu = create_ppu();
    ppu.write_register(PPUCTRL, 0x80);

    tick_until(&mut ppu, 241, 0);
    assert!(!ppu.flags().vblank);

    ppu.tick();
    assert!(ppu.flags().vblank);
    assert!(ppu.take_nmi());
    assert!(!ppu.take_nmi());
}

#[test]
fn vblank_without_nmi_enabled_does_not_raise_nmi() {
    let mut ppu = create_ppu();

    tick_until(&mut ppu, 241, 1);

    assert!(ppu.flags().vblank);
    assert!(!ppu.take_nmi());
}

#[test]
fn pre_render_line_clears_vblank() {
    let mut ppu = create_ppu();

    tick_until(&mut ppu, 261, 1);

    assert!(!ppu.flags().vblank);
}

#[test]
fn frame_completes_after_262_scanlines() {
    let mut ppu = create_ppu();

    for _ in 0..(DOTS_PER_SCANLINE as u32 * SCANLINES_PER_FRAME as u32 - 1) {
        ppu.tick();
    }
    assert!(!ppu.take_frame_complete());

    ppu.tick();
    assert!(ppu.take_frame_complete());
    assert_eq!(ppu.frame_count(), 1);
    assert_eq!((ppu.scanline(), ppu.dot()), (0, 0));
}

#[test]
fn status_read_clears_vblank_and_resets_the_address_latch() {
    let mut ppu = create_ppu();
    tick_until(&mut ppu, 241, 1);

    ppu.write_register(PPUADDR, 0x21);
    let status = ppu.read_register(PPUSTATUS);
    assert_ne!(status & 0x80, 0);
    assert!(!ppu.flags().vblank);

    // the latch is back on the high byte
    set_vram_address(&mut ppu, 0x2345);
    assert_eq!(ppu.vram_address(), 0x2345);
}

#[test]
fn enabling_nmi_during_vblank_fires_immediately() {
    let mut ppu = create_ppu();
    tick_until(&mut ppu, 245, 0);

    ppu.write_register(PPUCTRL, 0x80);

    assert!(ppu.take_nmi());
}

#[test]
fn ppudata_reads_are_buffered_below_palette() {
    let mut ppu = create_ppu();
    set_vram_address(&mut ppu, 0x2108);
    ppu.write_register(PPUDATA, 0xAB);
    ppu.write_register(PPUDATA, 0xCD);

    set_vram_address(&mut ppu, 0x2108);
    assert_eq!(ppu.read_register(PPUDATA), 0x00);
    assert_eq!(ppu.read_register(PPUDATA), 0xAB);
    assert_eq!(ppu.read_register(PPUDATA), 0xCD);
}

#[test]
fn ppudata_increment_follows_control_register() {
    let mut ppu = create_ppu();
    ppu.write_register(PPUCTRL, 0x04);
    set_vram_address(&mut ppu, 0x2000);

    ppu.write_register(PPUDATA, 0x11);

    assert_eq!(ppu.vram_address(), 0x2020);
}

#[test]
fn palette_reads_are_immediate_and_mirrored() {
    let mut ppu = create_ppu();
    set_vram_address(&mut ppu, 0x3F10);
    ppu.write_register(PPUDATA, 0x2A);

    set_vram_address(&mut ppu, 0x3F00);
    assert_eq!(ppu.read_register(PPUDATA), 0x2A);
}

#[test]
fn horizontal_mirroring_shares_first_two_nametables() {
    let mut ppu = create_ppu_with_nametable_mirroring(PpuNameTableMirroring::Horizontal);
    set_vram_address(&mut ppu, 0x2005);
    ppu.write_register(PPUDATA, 0x77);

    set_vram_address(&mut ppu, 0x2405);
    ppu.read_register(PPUDATA);
    assert_eq!(ppu.read_register(PPUDATA), 0x77);

    set_vram_address(&mut ppu, 0x2805);
    ppu.read_register(PPUDATA);
    assert_eq!(ppu.read_register(PPUDATA), 0x00);
}

#[test]
fn vertical_mirroring_shares_nametables_one_and_three() {
    let mut ppu = create_ppu_with_nametable_mirroring(PpuNameTableMirroring::Vertical);
    set_vram_address(&mut ppu, 0x2005);
    ppu.write_register(PPUDATA, 0x77);

    set_vram_address(&mut ppu, 0x2805);
    ppu.read_register(PPUDATA);
    assert_eq!(ppu.read_register(PPUDATA), 0x77);
}

#[test]
fn chr_ram_is_written_through_ppudata() {
    let cartridge = create_cartridge(PpuNameTableMirroring::Horizontal);
    let mut ppu = Ppu2c02::new();
    ppu.insert_cartridge(cartridge.clone());

    set_vram_address(&mut ppu, 0x1234);
    ppu.write_register(PPUDATA, 0x99);

    assert_eq!(cartridge.borrow().chr_read(0x1234), 0x99);
}

#[test]
fn oam_data_writes_advance_oam_address() {
    let mut ppu = create_ppu();
    ppu.write_register(OAMADDR, 0x10);
    ppu.write_register(OAMDATA, 0x01);
    ppu.write_register(OAMDATA, 0x02);

    assert_eq!(ppu.oam()[0x10], 0x01);
    assert_eq!(ppu.oam()[0x11], 0x02);
}

#[test]
fn scroll_writes_set_fine_x() {
    let mut ppu = create_ppu();
    ppu.write_register(PPUSCROLL, 0x0D);
    ppu.write_register(PPUSCROLL, 0x00);

    assert_eq!(ppu.fine_x_scroll(), 0x05);
}

#[test]
fn sprite_zero_hit_requires_rendering() {
    let mut ppu = create_ppu();
    ppu.write_register(OAMADDR, 0x00);
    for byte in [0x20, 0x00, 0x00, 0x40] {
        ppu.write_register(OAMDATA, byte);
    }

    tick_until(&mut ppu, 100, 0);
    assert!(!ppu.flags().sprite0_hit);

    let mut ppu = create_ppu();
    ppu.write_register(OAMADDR, 0x00);
    for byte in [0x20, 0x00, 0x00, 0x40] {
        ppu.write_register(OAMDATA, byte);
    }
    ppu.write_register(PPUMASK, 0x18);

    tick_until(&mut ppu, 0x21, 0x41);
    assert!(ppu.flags().sprite0_hit);

    tick_until(&mut ppu, 261, 1);
    assert!(!ppu.flags().sprite0_hit);
}

#[test]
fn control_register_decodes_into_flags() {
    let mut ppu = create_ppu();
    ppu.write_register(PPUCTRL, 0xB8);
    ppu.write_register(PPUMASK, 0x08);

    let flags = ppu.flags();
    assert!(flags.nmi_on_vblank);
    assert!(flags.sprite_size);
    assert!(flags.bg_pattern_table);
    assert!(flags.sprite_pattern_table);
    assert!(flags.bg_visible);
    assert!(!flags.sprite_visible);
}

#[test]
fn palette_ram_dump_resolves_backdrop_mirrors_without_side_effects() {
    let mut ppu = create_ppu();
    set_vram_address(&mut ppu, 0x3F00);
    for value in 0..32u8 {
        ppu.write_register(PPUDATA, value);
    }
    let addr_before = ppu.vram_address();

    let palette = ppu.palette_ram();

    assert_eq!(palette.len(), 32);
    assert_eq!(palette[0x01], 0x01);
    assert_eq!(palette[0x11], 0x11);
    assert_eq!(palette[0x00], 0x10);
    assert_eq!(palette[0x0C], 0x1C);
    for backdrop in [0x10, 0x14, 0x18, 0x1C] {
        assert_eq!(palette[backdrop], palette[backdrop - 0x10]);
    }
    assert_eq!(ppu.vram_address(), addr_before);
}
