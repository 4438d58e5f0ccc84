//! Parameter file written alongside each recording.
//!
//! The file is pretty-printed JSON with sorted keys and every float written
//! with six decimals, so files from different recordings diff cleanly.

use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};

use serde::Serialize;
use serde_json::ser::{Formatter, PrettyFormatter};

use rpicamera_core::{AwbGains, AwbMode, Device, SyncMode, ZoomRect};

use crate::error::ServerResult;
use crate::session::Session;

/// Camera state and session identifiers at recording start.
///
/// Fields are declared in key order; the serialized keys come out sorted.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ParameterSnapshot {
    pub awb_gains: AwbGains,
    pub awb_mode: AwbMode,
    pub brightness: u32,
    pub experiment: u32,
    pub framerate: f64,
    pub height: u32,
    pub hflip: bool,
    pub rec_path: PathBuf,
    pub recording: u32,
    pub sync_mode: SyncMode,
    pub trigger_timeout: f64,
    pub vflip: bool,
    pub video_path: PathBuf,
    pub wait_for_trigger: bool,
    pub width: u32,
    pub zoom: ZoomRect,
}

impl ParameterSnapshot {
    /// Reads the current device state for `session`.
    pub fn capture(device: &dyn Device, session: &Session) -> Self {
        let resolution = device.resolution();
        let trigger = device.trigger_settings();
        Self {
            awb_gains: device.awb_gains(),
            awb_mode: device.awb_mode(),
            brightness: device.brightness(),
            experiment: session.experiment,
            framerate: device.framerate(),
            height: resolution.height,
            hflip: device.hflip(),
            rec_path: session.rec_path.clone(),
            recording: session.recording,
            sync_mode: trigger.sync_mode,
            trigger_timeout: trigger.trigger_timeout,
            vflip: device.vflip(),
            video_path: session.video_path.clone(),
            wait_for_trigger: trigger.wait_for_trigger,
            width: resolution.width,
            zoom: device.zoom(),
        }
    }

    /// Serializes the snapshot into `writer`.
    pub fn to_writer<W: Write>(&self, writer: W) -> ServerResult<()> {
        let mut serializer =
            serde_json::Serializer::with_formatter(writer, FixedFloatFormatter::new());
        self.serialize(&mut serializer)?;
        Ok(())
    }

    /// Writes the snapshot to `path`, replacing any existing file.
    pub fn write(&self, path: &Path) -> ServerResult<()> {
        let mut writer = BufWriter::new(File::create(path)?);
        self.to_writer(&mut writer)?;
        writer.flush()?;
        Ok(())
    }
}

/// Pretty printer that writes floats with six decimals.
struct FixedFloatFormatter {
    pretty: PrettyFormatter<'static>,
}

impl FixedFloatFormatter {
    fn new() -> Self {
        Self {
            pretty: PrettyFormatter::with_indent(b"    "),
        }
    }
}

impl Formatter for FixedFloatFormatter {
    fn write_f32<W>(&mut self, writer: &mut W, value: f32) -> io::Result<()>
    where
        W: ?Sized + Write,
    {
        write!(writer, "{value:.6}")
    }

    fn write_f64<W>(&mut self, writer: &mut W, value: f64) -> io::Result<()>
    where
        W: ?Sized + Write,
    {
        write!(writer, "{value:.6}")
    }

    fn begin_array<W>(&mut self, writer: &mut W) -> io::Result<()>
    where
        W: ?Sized + Write,
    {
        self.pretty.begin_array(writer)
    }

    fn end_array<W>(&mut self, writer: &mut W) -> io::Result<()>
    where
        W: ?Sized + Write,
    {
        self.pretty.end_array(writer)
    }

    fn begin_array_value<W>(&mut self, writer: &mut W, first: bool) -> io::Result<()>
    where
        W: ?Sized + Write,
    {
        self.pretty.begin_array_value(writer, first)
    }

    fn end_array_value<W>(&mut self, writer: &mut W) -> io::Result<()>
    where
        W: ?Sized + Write,
    {
        self.pretty.end_array_value(writer)
    }

    fn begin_object<W>(&mut self, writer: &mut W) -> io::Result<()>
    where
        W: ?Sized + Write,
    {
        self.pretty.begin_object(writer)
    }

    fn end_object<W>(&mut self, writer: &mut W) -> io::Result<()>
    where
        W: ?Sized + Write,
    {
        self.pretty.end_object(writer)
    }

    fn begin_object_key<W>(&mut self, writer: &mut W, first: bool) -> io::Result<()>
    where
        W: ?Sized + Write,
    {
        self.pretty.begin_object_key(writer, first)
    }

    fn begin_object_value<W>(&mut self, writer: &mut W) -> io::Result<()>
    where
        W: ?Sized + Write,
    {
        self.pretty.begin_object_value(writer)
    }

    fn end_object_value<W>(&mut self, writer: &mut W) -> io::Result<()>
    where
        W: ?Sized + Write,
    {
        self.pretty.end_object_value(writer)
    }
}
