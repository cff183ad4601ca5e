use std::collections::BTreeMap;
use serde::Serialize;
use crate::emulation_core::EmulationCore;

pub const WORK_RAM_SIZE: usize = 0x0800;
pub const OAM_SIZE: usize = 256;
pub const CONTROLLER_STATE_SIZE: usize = 8;
const CONTROLLER_RELEASED: u8 = 0x40;
const CONTROLLERS: [u8; 2] = [1, 2];

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CpuSnapshot {
    pub pc: u16,
    pub a: u8,
    pub x: u8,
    pub y: u8,
    pub sp: u8,
    pub status: u8,
    pub mem: Vec<u8>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PpuSnapshot {
    pub ctrl: u8,
    pub mask: u8,
    pub status: u8,
    pub nmi_on_vblank: u8,
    pub sprite_size: u8,
    pub bg_pattern_table: u8,
    #[serde(rename = "spPatternTable")]
    pub sprite_pattern_table: u8,
}

/// Frozen, core-independent view of the machine as returned by `getState`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StateSnapshot {
    pub frame: u64,
    pub cpu: CpuSnapshot,
    pub ppu: PpuSnapshot,
    pub oam: Vec<u8>,
    pub controllers: BTreeMap<String, Vec<u8>>,
}

fn resized(mut bytes: Vec<u8>, size: usize, fill: u8) -> Vec<u8> {
    bytes.resize(size, fill);
    bytes
}

impl StateSnapshot {
    pub fn capture(core: &dyn EmulationCore, frame: u64) -> StateSnapshot {
        let cpu = core.cpu_state();
        let ppu = core.ppu_state();

        let cpu = CpuSnapshot {
            pc: cpu.pc,
            a: cpu.a,
            x: cpu.x,
            y: cpu.y,
            sp: cpu.sp,
            status: cpu.status,
            mem: (0..WORK_RAM_SIZE as u16).map(|addr| core.read_memory(addr)).collect(),
        };

        let ppu = PpuSnapshot {
            ctrl: (ppu.nmi_on_vblank as u8) << 7 | (ppu.sprite_size as u8) << 5,
            mask: ppu.bg_visible as u8 | (ppu.sprite_visible as u8) << 1,
            status: (ppu.vblank as u8) << 7,
            nmi_on_vblank: ppu.nmi_on_vblank as u8,
            sprite_size: ppu.sprite_size as u8,
            bg_pattern_table: ppu.bg_pattern_table as u8,
            sprite_pattern_table: ppu.sprite_pattern_table as u8,
        };

        let controllers = CONTROLLERS.iter()
            .map(|controller| {
                let state = resized(core.controller_state(*controller), CONTROLLER_STATE_SIZE, CONTROLLER_RELEASED);
                (controller.to_string(), state)
            })
            .collect();

        StateSnapshot {
            frame,
            cpu,
            ppu,
            oam: resized(core.sprite_memory(), OAM_SIZE, 0),
            controllers,
        }
    }
}
