use crate::cartridge::{ChrMemory, PpuNameTableMirroring};
use crate::ines_loader::{INesLoader, INesRomHeader};
use crate::loader::LoaderError;
use crate::mapper::NesMapper;
use crate::tests::{ines_header, init, CHR_BANK_SIZE, PRG_BANK_SIZE};
use crate::unrom_cartridge::UnromCartridge;
use crate::cartridge::Cartridge;

fn image_with_banks(prg_banks: u8, chr_banks: u8, flags6: u8, flags7: u8) -> Vec<u8> {
    let mut image = ines_header(prg_banks, chr_banks, flags6, flags7);
    for bank in 0..prg_banks {
        image.extend(vec![bank; PRG_BANK_SIZE]);
    }
    image.extend(vec![0xC7; chr_banks as usize * CHR_BANK_SIZE]);
    image
}

#[test]
fn header_with_wrong_preamble_is_rejected() {
    init();
    let mut image = image_with_banks(1, 1, 0, 0);
    image[3] = 0x1B;

    assert_eq!(INesRomHeader::from_bytes(&image), Err(LoaderError::InvalidRomFormat));
}

#[test]
fn image_shorter_than_header_is_rejected() {
    init();
    assert_eq!(INesLoader::from_bytes(b"NES\x1A").unwrap_err(), LoaderError::InvalidRomFormat);
}

#[test]
fn truncated_image_reports_expected_size() {
    init();
    let mut image = image_with_banks(1, 1, 0, 0);
    image.truncate(100);

    assert_eq!(INesLoader::from_bytes(&image).unwrap_err(),
               LoaderError::Truncated { expected: 16 + PRG_BANK_SIZE + CHR_BANK_SIZE, actual: 100 });
}

#[test]
fn header_fields_are_decoded() {
    init();
    let image = image_with_banks(2, 1, 0x23, 0x00);

    let header = INesRomHeader::from_bytes(&image).unwrap();

    assert_eq!(header.prg_rom_size, 2 * PRG_BANK_SIZE);
    assert_eq!(header.chr_rom_size, CHR_BANK_SIZE);
    assert_eq!(header.nametables_layout, PpuNameTableMirroring::Vertical);
    assert!(header.battery);
    assert!(!header.trainer);
    assert_eq!(header.mapper, NesMapper::UxROM);
}

#[test]
fn mapper_number_combines_both_nibbles() {
    init();
    let image = image_with_banks(1, 1, 0x40, 0x00);
    assert_eq!(INesRomHeader::from_bytes(&image).unwrap().mapper, NesMapper::MMC3);

    let image = image_with_banks(1, 1, 0x20, 0x40);
    assert_eq!(INesRomHeader::from_bytes(&image).unwrap().mapper, NesMapper::Unknown(0x42));
}

#[test]
fn unsupported_mapper_is_rejected() {
    init();
    let image = image_with_banks(1, 1, 0x40, 0x00);

    let result = INesLoader::from_bytes(&image).unwrap().build_cartridge();

    match result {
        Err(LoaderError::UnsupportedMapper(name)) => assert_eq!(name, "MMC3 (mapper 4)"),
        other => panic!("unexpected result: {:?}", other.map(|_| ())),
    }
}

#[test]
fn nrom_128_is_mirrored_into_upper_bank() {
    init();
    let mut image = image_with_banks(1, 1, 0, 0);
    image[16] = 0x4C;

    let cartridge = INesLoader::from_bytes(&image).unwrap().build_cartridge().unwrap();

    assert_eq!(cartridge.borrow().mapper(), NesMapper::NROM);
    assert_eq!(cartridge.borrow().cpu_read(0x8000), 0x4C);
    assert_eq!(cartridge.borrow().cpu_read(0xC000), 0x4C);
    assert_eq!(cartridge.borrow().chr_read(0x0000), 0xC7);
}

#[test]
fn trainer_is_skipped() {
    init();
    let mut image = ines_header(1, 0, 0x04, 0x00);
    image.extend(vec![0xEE; 512]);
    image.extend(vec![0x11; PRG_BANK_SIZE]);

    let cartridge = INesLoader::from_bytes(&image).unwrap().build_cartridge().unwrap();

    assert_eq!(cartridge.borrow().cpu_read(0x8000), 0x11);
}

#[test]
fn missing_chr_rom_means_writable_chr_ram() {
    init();
    let image = image_with_banks(1, 0, 0, 0);
    let cartridge = INesLoader::from_bytes(&image).unwrap().build_cartridge().unwrap();

    cartridge.borrow_mut().chr_write(0x0100, 0x5A);

    assert_eq!(cartridge.borrow().chr_read(0x0100), 0x5A);
}

#[test]
fn chr_rom_ignores_writes() {
    init();
    let mut chr = ChrMemory::rom(vec![0x01; CHR_BANK_SIZE]);

    chr.write(0x0010, 0xFF);

    assert_eq!(chr.read(0x0010), 0x01);
}

#[test]
fn prg_ram_is_available_at_6000() {
    init();
    let image = image_with_banks(1, 1, 0, 0);
    let cartridge = INesLoader::from_bytes(&image).unwrap().build_cartridge().unwrap();

    cartridge.borrow_mut().cpu_write(0x6004, 0x42);

    assert_eq!(cartridge.borrow().cpu_read(0x6004), 0x42);
}

#[test]
fn unrom_switches_lower_bank_and_fixes_the_last() {
    init();
    let image = image_with_banks(4, 0, 0x20, 0x00);
    let cartridge = INesLoader::from_bytes(&image).unwrap().build_cartridge().unwrap();

    assert_eq!(cartridge.borrow().cpu_read(0x8000), 0);
    assert_eq!(cartridge.borrow().cpu_read(0xC000), 3);

    cartridge.borrow_mut().cpu_write(0x8000, 0x02);

    assert_eq!(cartridge.borrow().cpu_read(0x8000), 2);
    assert_eq!(cartridge.borrow().cpu_read(0xBFFF), 2);
    assert_eq!(cartridge.borrow().cpu_read(0xFFFF), 3);
}

#[test]
fn unrom_bank_select_wraps_on_small_boards() {
    init();
    let mut cartridge = UnromCartridge::new(vec![0; 2 * PRG_BANK_SIZE], ChrMemory::ram(CHR_BANK_SIZE), PpuNameTableMirroring::Vertical).unwrap();

    cartridge.cpu_write(0xC000, 0x03);

    assert_eq!(cartridge.selected_bank(), 1);
}

#[test]
fn unrom_reset_selects_bank_zero_and_clears_ram() {
    init();
    let image = image_with_banks(4, 0, 0x20, 0x00);
    let cartridge = INesLoader::from_bytes(&image).unwrap().build_cartridge().unwrap();
    cartridge.borrow_mut().cpu_write(0x8000, 0x02);
    cartridge.borrow_mut().cpu_write(0x6010, 0x55);
    cartridge.borrow_mut().chr_write(0x0100, 0x66);

    cartridge.borrow_mut().reset();

    assert_eq!(cartridge.borrow().cpu_read(0x8000), 0);
    assert_eq!(cartridge.borrow().cpu_read(0xC000), 3);
    assert_eq!(cartridge.borrow().cpu_read(0x6010), 0);
    assert_eq!(cartridge.borrow().chr_read(0x0100), 0);
}

#[test]
fn nrom_reset_keeps_chr_rom() {
    init();
    let image = image_with_banks(1, 1, 0x00, 0x00);
    let cartridge = INesLoader::from_bytes(&image).unwrap().build_cartridge().unwrap();
    cartridge.borrow_mut().cpu_write(0x7FFF, 0x21);

    cartridge.borrow_mut().reset();

    assert_eq!(cartridge.borrow().cpu_read(0x7FFF), 0);
    assert_eq!(cartridge.borrow().chr_read(0x0000), 0xC7);
}
