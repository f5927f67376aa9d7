//! TrueType instruction execution.

mod arith;
mod control_flow;
mod cvt;
mod definition;
mod dispatch;
mod graphics;
mod logical;
mod misc;
mod outline;
mod stack;
mod storage;

use runik_types::{GlyphId, Point};

use super::{
    call_stack::CallStack,
    code::Decoder,
    definition::DefinitionMap,
    error::{HintError, HintErrorKind},
    graphics::{Axis, GraphicsState, ZonePointer},
    math,
    program::{ProgramKind, Programs},
    storage::Storage,
    value_stack::ValueStack,
    zone::Zone,
};

pub type OpResult = Result<(), HintErrorKind>;

/// Capacity limits taken from the `maxp` TrueType profile.
#[derive(Copy, Clone, Debug)]
pub struct EngineLimits {
    pub stack: usize,
    pub storage: usize,
    pub functions: usize,
    pub twilight_points: usize,
}

/// The instruction interpreter.
///
/// Holds the value and call stacks, the storage and control value
/// arrays, function definitions, the graphics state and the twilight
/// and glyph zones. One engine survives across glyphs at a fixed size;
/// the glyph zone is swapped per glyph.
pub struct Engine<'a> {
    programs: Programs<'a>,
    program: ProgramKind,
    decoder: Decoder<'a>,
    glyph_id: Option<GlyphId>,
    value_stack: ValueStack,
    call_stack: CallStack,
    storage: Storage,
    cvt: Vec<i32>,
    functions: DefinitionMap,
    instruction_defs: DefinitionMap,
    graphics: GraphicsState,
    zones: [Zone; 2],
    ppem: u16,
    /// Nominal point size in 26.6.
    point_size: i32,
    /// Font units to 26.6 pixels, 16.16.
    scale: i32,
    rotated: bool,
}

impl<'a> Engine<'a> {
    pub fn new(programs: Programs<'a>, cvt: Vec<i32>, limits: EngineLimits) -> Self {
        Engine {
            programs,
            program: ProgramKind::Font,
            decoder: Decoder::new(programs.font, 0),
            glyph_id: None,
            value_stack: ValueStack::new(limits.stack),
            call_stack: CallStack::default(),
            storage: Storage::new(limits.storage),
            cvt,
            functions: DefinitionMap::new(limits.functions),
            // IDEF entries are keyed by opcode
            instruction_defs: DefinitionMap::new(256),
            graphics: GraphicsState::default(),
            zones: [Zone::twilight(limits.twilight_points), Zone::default()],
            ppem: 0,
            point_size: 0,
            scale: 0,
            rotated: false,
        }
    }

    /// A zero-capacity placeholder, used while a glyph run temporarily
    /// owns the live engine.
    pub(crate) fn empty() -> Engine<'static> {
        Engine {
            programs: Programs::default(),
            program: ProgramKind::Font,
            decoder: Decoder::new(&[], 0),
            glyph_id: None,
            value_stack: ValueStack::new(0),
            call_stack: CallStack::default(),
            storage: Storage::new(0),
            cvt: Vec::new(),
            functions: DefinitionMap::new(0),
            instruction_defs: DefinitionMap::new(0),
            graphics: GraphicsState::default(),
            zones: [Zone::default(), Zone::default()],
            ppem: 0,
            point_size: 0,
            scale: 0,
            rotated: false,
        }
    }

    /// Moves the engine's state onto a new set of programs.
    ///
    /// Glyph bytecode lives shorter than the font tables, so each glyph
    /// run rebinds the engine to the intersection of the two lifetimes
    /// and back.
    pub(crate) fn rebind<'b>(self, programs: Programs<'b>) -> Engine<'b> {
        Engine {
            programs,
            program: ProgramKind::Font,
            decoder: Decoder::new(programs.font, 0),
            glyph_id: None,
            value_stack: self.value_stack,
            call_stack: self.call_stack,
            storage: self.storage,
            cvt: self.cvt,
            functions: self.functions,
            instruction_defs: self.instruction_defs,
            graphics: self.graphics,
            zones: self.zones,
            ppem: self.ppem,
            point_size: self.point_size,
            scale: self.scale,
            rotated: self.rotated,
        }
    }

    /// Sets the rasterization size: pixels per em, point size in 26.6
    /// and the 16.16 font unit to 26.6 pixel scale.
    pub fn set_size(&mut self, ppem: u16, point_size: i32, scale: i32) {
        self.ppem = ppem;
        self.point_size = point_size;
        self.scale = scale;
    }

    pub fn graphics(&self) -> &GraphicsState {
        &self.graphics
    }

    pub fn cvt_values(&self) -> &[i32] {
        &self.cvt
    }

    /// Installs the outline to hint and returns it when the program has
    /// run.
    pub fn set_glyph_zone(&mut self, zone: Zone) {
        self.zones[1] = zone;
    }

    pub fn take_glyph_zone(&mut self) -> Zone {
        core::mem::take(&mut self.zones[1])
    }

    /// Runs one of the three programs from its start.
    pub fn run_program(
        &mut self,
        kind: ProgramKind,
        glyph_id: Option<GlyphId>,
    ) -> Result<(), HintError> {
        self.program = kind;
        self.glyph_id = glyph_id;
        self.decoder = Decoder::new(self.programs.get(kind), 0);
        self.value_stack.clear();
        self.call_stack.clear();
        match kind {
            ProgramKind::Font => {
                self.functions.reset();
                self.instruction_defs.reset();
                self.graphics = GraphicsState::default();
            }
            ProgramKind::ControlValue => {
                self.graphics = GraphicsState::default();
            }
            ProgramKind::Glyph => {
                self.graphics.reset_for_glyph();
            }
        }
        self.run()
    }

    fn zone(&self, pointer: ZonePointer) -> &Zone {
        &self.zones[pointer as usize]
    }

    fn zone_mut(&mut self, pointer: ZonePointer) -> &mut Zone {
        &mut self.zones[pointer as usize]
    }

    fn cvt_get(&self, index: usize) -> Result<i32, HintErrorKind> {
        self.cvt
            .get(index)
            .copied()
            .ok_or(HintErrorKind::InvalidCvtIndex(index))
    }

    fn cvt_set(&mut self, index: usize, value: i32) -> OpResult {
        *self
            .cvt
            .get_mut(index)
            .ok_or(HintErrorKind::InvalidCvtIndex(index))? = value;
        Ok(())
    }

    /// Converts font units to 26.6 pixels at the current scale.
    fn scale_units(&self, value: i32) -> i32 {
        math::mul_div(value, self.scale, 1 << 16)
    }

    /// Moves a point along the freedom vector so its projected position
    /// changes by `distance`, touching the affected axes.
    fn move_point(&mut self, pointer: ZonePointer, index: usize, distance: i32) -> OpResult {
        let fv = self.graphics.freedom_vector;
        let fdotp = self.graphics.fdotp;
        let zone = self.zone_mut(pointer);
        if fv.x != 0 {
            zone.point_mut(index)?.x += math::mul_div(distance, fv.x, fdotp);
            zone.touch(index, Axis::X)?;
        }
        if fv.y != 0 {
            zone.point_mut(index)?.y += math::mul_div(distance, fv.y, fdotp);
            zone.touch(index, Axis::Y)?;
        }
        Ok(())
    }

    /// Shifts a point by a precomputed delta, optionally touching it.
    fn shift_point(
        &mut self,
        pointer: ZonePointer,
        index: usize,
        delta: Point<i32>,
        touch: bool,
    ) -> OpResult {
        let fv = self.graphics.freedom_vector;
        let zone = self.zone_mut(pointer);
        if fv.x != 0 {
            zone.point_mut(index)?.x += delta.x;
            if touch {
                zone.touch(index, Axis::X)?;
            }
        }
        if fv.y != 0 {
            zone.point_mut(index)?.y += delta.y;
            if touch {
                zone.touch(index, Axis::Y)?;
            }
        }
        Ok(())
    }

    /// How far a reference point has moved from its original position,
    /// as a freedom vector delta. Shared by the SHP/SHC/SHZ family;
    /// `use_rp1` selects rp1 in zp0 over rp2 in zp1.
    fn point_displacement(
        &self,
        use_rp1: bool,
    ) -> Result<(Point<i32>, ZonePointer, usize), HintErrorKind> {
        let gs = &self.graphics;
        let (pointer, reference) = if use_rp1 {
            (gs.zp0, gs.rp1)
        } else {
            (gs.zp1, gs.rp2)
        };
        let zone = self.zone(pointer);
        let distance = gs.project(zone.point(reference)? - zone.original(reference)?);
        let delta = Point::new(
            math::mul_div(distance, gs.freedom_vector.x, gs.fdotp),
            math::mul_div(distance, gs.freedom_vector.y, gs.fdotp),
        );
        Ok((delta, pointer, reference))
    }

    /// Bounds for a jump target: the active definition when executing a
    /// function, the whole program otherwise.
    fn jump_bounds(&self) -> (usize, usize) {
        match self.call_stack.peek() {
            Some(record) if record.definition.program == self.program => {
                let range = record.definition.range();
                (range.start, range.end)
            }
            _ => (0, self.decoder.bytecode.len()),
        }
    }
}
