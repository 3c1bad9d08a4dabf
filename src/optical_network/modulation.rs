use lazy_static::lazy_static;

use super::FSU_WIDTH_GHZ;

pub type RateGbps = f64;
pub type BandWidthGHZ = f64;
pub type DistanceKM = f64;

#[derive(Clone,Debug,PartialEq)]
pub struct ModulationFormat {
    pub name:&'static str,
    pub rate:RateGbps,
    pub bandwidth:BandWidthGHZ,
    pub max_reach:DistanceKM
}

impl ModulationFormat {
    // Gbps carried per GHz of spectrum
    pub fn spectral_efficiency(&self) -> f64 {
        self.rate/self.bandwidth
    }
}

lazy_static! {
    // ordered by reach, shortest first, which is also highest rate first
    // the last entry also serves every length beyond its reach
    pub static ref MODULATION_FORMATS:Vec<ModulationFormat> = vec![
        ModulationFormat {name:"DP-16QAM",rate:400.0,bandwidth:75.0,max_reach:500.0},
        ModulationFormat {name:"SC-DP-16QAM",rate:200.0,bandwidth:37.5,max_reach:700.0},
        ModulationFormat {name:"SC-DP-QPSK",rate:100.0,bandwidth:37.5,max_reach:2000.0},
    ];
}

// highest order format whose reach covers the length, bounds are inclusive
pub fn select_modulation(length:DistanceKM) -> &'static ModulationFormat {
    let last = MODULATION_FORMATS.len() - 1;
    MODULATION_FORMATS[..last].iter()
        .find(|format| length <= format.max_reach)
        .unwrap_or(&MODULATION_FORMATS[last])
}

pub fn max_capacity(length:DistanceKM) -> RateGbps {
    select_modulation(length).rate
}

#[derive(Clone,Copy,Debug,PartialEq)]
pub struct FsuRequirement {
    pub slot_count:usize,
    pub modulation:&'static ModulationFormat
}

impl FsuRequirement {
    pub fn modulation_name(&self) -> &'static str {
        self.modulation.name
    }
}

// slots = ceil(demand / efficiency / 12.5), at least 1 for a positive demand
pub fn required_fsus(demand:RateGbps,length:DistanceKM) -> FsuRequirement {
    let modulation = select_modulation(length);
    let required_ghz = demand/modulation.spectral_efficiency();
    let mut slot_count = (required_ghz/FSU_WIDTH_GHZ).ceil().max(0.0) as usize;
    if demand > 0.0 && slot_count == 0 {
        slot_count = 1;
    }
    FsuRequirement {slot_count,modulation}
}

// equal parts no larger than the channel capacity of the length,
// a non-finite demand comes back whole for the assigner to reject
pub fn split_traffic(demand:RateGbps,length:DistanceKM) -> Vec<RateGbps> {
    let capacity = max_capacity(length);
    if !demand.is_finite() || demand <= capacity {
        return vec![demand];
    }
    let parts = ((demand/capacity).ceil() as usize).max(2);
    vec![demand/parts as f64;parts]
}
