//! DUT seam: the CAM's pin set and the trait the kernel drives.

use crate::model::{OE_DRIVEN, RESET_MATCH, SLOTS};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Pin {
    Clk,
    RstN,
    We,
    Content,
    FoundAddr,
    Oe,
}

impl Pin {
    pub const ALL: [Pin; 6] = [
        Pin::Clk,
        Pin::RstN,
        Pin::We,
        Pin::Content,
        Pin::FoundAddr,
        Pin::Oe,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Pin::Clk => "clk",
            Pin::RstN => "rst_n",
            Pin::We => "we",
            Pin::Content => "content",
            Pin::FoundAddr => "found_addr",
            Pin::Oe => "oe",
        }
    }

    pub fn width(self) -> u32 {
        match self {
            Pin::Clk | Pin::RstN | Pin::We => 1,
            Pin::Content | Pin::Oe => 8,
            Pin::FoundAddr => 16,
        }
    }

    pub fn is_input(self) -> bool {
        !matches!(self, Pin::FoundAddr | Pin::Oe)
    }
}

/// Values currently driven onto the DUT inputs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct CamInputs {
    pub clk: bool,
    pub rst_n: bool,
    pub we: bool,
    pub content: u8,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CamOutputs {
    pub found_addr: u16,
    pub oe: u8,
}

/// A CAM implementation the kernel can host.
///
/// The kernel calls [`Dut::eval`] after every input change and, when `clk`
/// rises, [`Dut::rising_edge`] right after it, before any testbench task sees
/// the edge. Inputs passed to `rising_edge` are the values present at the edge.
pub trait Dut: Send {
    fn name(&self) -> &str {
        "cam"
    }
    /// Asynchronous logic, e.g. the active-low reset.
    fn eval(&mut self, inputs: &CamInputs);
    fn rising_edge(&mut self, inputs: &CamInputs);
    fn outputs(&self) -> CamOutputs;
}

/// Behavioral model of the CAM hardware, standing in for the HDL.
///
/// `found_addr` is registered: at each rising edge it takes the match of the
/// current `content` against the slots as they were before that edge's write.
#[derive(Debug, Clone)]
pub struct BehavioralCam {
    mem: [u8; SLOTS],
    wp: usize,
    found_addr: u16,
    oe: u8,
}

impl Default for BehavioralCam {
    fn default() -> Self {
        Self::new()
    }
}

impl BehavioralCam {
    /// Power-up state is the reset state.
    pub fn new() -> Self {
        Self {
            mem: [0; SLOTS],
            wp: 0,
            found_addr: RESET_MATCH.bits(),
            oe: 0,
        }
    }

    fn compare(&self, content: u8) -> u16 {
        let mut bits = 0;
        for (i, v) in self.mem.iter().enumerate() {
            if *v == content {
                bits |= 1 << i;
            }
        }
        bits
    }
}

impl Dut for BehavioralCam {
    fn eval(&mut self, inputs: &CamInputs) {
        if !inputs.rst_n {
            self.mem = [0; SLOTS];
            self.wp = 0;
            self.found_addr = RESET_MATCH.bits();
            self.oe = 0;
        } else {
            self.oe = OE_DRIVEN;
        }
    }

    fn rising_edge(&mut self, inputs: &CamInputs) {
        if !inputs.rst_n {
            return;
        }
        self.found_addr = self.compare(inputs.content);
        if inputs.we {
            self.mem[self.wp] = inputs.content;
            self.wp = (self.wp + 1) % SLOTS;
        }
    }

    fn outputs(&self) -> CamOutputs {
        CamOutputs {
            found_addr: self.found_addr,
            oe: self.oe,
        }
    }
}
