//! End-to-end cycles against the linked FFmpeg libraries

use avkit::ffi::{AVMediaType, AVPixelFormat, AVRational, AVSampleFormat};
use avkit::{
  BufferSrc, ChannelLayout, CodecState, Decoder, Encoder, Error, Filter, FilterGraph, MediaReader,
  MediaWriter, OwnedFrame, Outcome, Packet, ScaleAlgorithm, ScaleParams, Scaler,
};

const SAMPLE_RATE: i32 = 8000;

fn pcm_encoder() -> Encoder {
  let mut enc = Encoder::by_name("pcm_s16le").unwrap();
  enc.set_sample_fmt(AVSampleFormat::S16);
  enc.set_sample_rate(SAMPLE_RATE);
  enc.set_ch_layout(&ChannelLayout::default_for(1)).unwrap();
  enc.set_time_base(AVRational::new(1, SAMPLE_RATE));
  enc.open(None).unwrap();
  enc
}

fn tone(index: i64, nb_samples: i32) -> OwnedFrame {
  let layout = ChannelLayout::default_for(1);
  let mut frame = OwnedFrame::new_audio(nb_samples, AVSampleFormat::S16, SAMPLE_RATE, &layout).unwrap();
  let plane = frame.plane_mut(0).unwrap();
  for (i, sample) in plane.chunks_exact_mut(2).enumerate() {
    let value = ((index as usize * 31 + i * 7) % 2000) as i16 - 1000;
    sample.copy_from_slice(&value.to_le_bytes());
  }
  frame.set_pts(index * i64::from(nb_samples));
  frame
}

/// (size, pts) of every packet of a three-frame PCM encode
fn encode_pcm_run() -> Vec<(i32, i64)> {
  let mut enc = pcm_encoder();
  let mut packets = Vec::new();
  for i in 0..3 {
    let frame = tone(i, 160);
    enc
      .encode(Some(&*frame), |pkt| {
        packets.push((pkt.size(), pkt.pts()));
        Ok::<(), Error>(())
      })
      .unwrap();
  }
  enc
    .encode(None, |pkt| {
      packets.push((pkt.size(), pkt.pts()));
      Ok::<(), Error>(())
    })
    .unwrap();
  assert_eq!(enc.state(), CodecState::Flushed);
  packets
}

#[test]
fn test_pcm_encode_is_deterministic() {
  let first = encode_pcm_run();
  let second = encode_pcm_run();
  assert_eq!(first, vec![(320, 0), (320, 160), (320, 320)]);
  assert_eq!(first, second);
}

#[test]
fn test_end_of_stream_repeats() {
  let mut enc = pcm_encoder();
  let frame = tone(0, 80);
  assert!(enc.send_frame(Some(&*frame)).unwrap().is_ready());
  assert!(enc.send_frame(None).unwrap().is_ready());
  assert_eq!(enc.state(), CodecState::Draining);

  let mut sizes = Vec::new();
  loop {
    match enc.receive_packet().unwrap() {
      Outcome::Ready(pkt) => sizes.push(pkt.size()),
      Outcome::RetryLater => panic!("draining encoder asked for input"),
      Outcome::EndOfStream => break,
    }
  }
  assert_eq!(sizes, vec![160]);
  for _ in 0..3 {
    assert!(enc.receive_packet().unwrap().is_end_of_stream());
  }

  let mut dec = Decoder::new(avkit::Codec::find_decoder_by_name("pcm_s16le").unwrap()).unwrap();
  dec.set_sample_rate(SAMPLE_RATE);
  dec.set_ch_layout(&ChannelLayout::default_for(1)).unwrap();
  dec.open(None).unwrap();
  dec.send_packet(None).unwrap();
  for _ in 0..3 {
    assert!(dec.receive_frame().unwrap().is_end_of_stream());
  }
  assert_eq!(dec.state(), CodecState::Flushed);
}

#[test]
fn test_owning_wrappers_move_freely() {
  fn keep(frames: Vec<OwnedFrame>) -> Vec<OwnedFrame> {
    frames
  }

  let frames: Vec<OwnedFrame> = (0..4).map(|i| tone(i, 32)).collect();
  let frames = keep(frames);
  let last = frames.into_iter().last().unwrap();
  assert_eq!(last.pts(), 96);

  let packets: Vec<Packet> = (0..3)
    .map(|i| Packet::from_slice(&[i as u8; 4]).unwrap())
    .collect();
  let boxed: Box<[Packet]> = packets.into_boxed_slice();
  assert_eq!(boxed[2].data(), &[2u8; 4][..]);
}

#[test]
fn test_failures_name_the_operation() {
  let err = Encoder::by_name("definitely_not_an_encoder").unwrap_err();
  assert!(matches!(
    err,
    Error::Configuration {
      op: "avcodec_find_encoder_by_name",
      ..
    }
  ));

  let empty = ScaleParams::new(0, 0, AVPixelFormat::YUV420P);
  let err = Scaler::new(empty, empty, ScaleAlgorithm::Bicubic).unwrap_err();
  assert_eq!(err.op(), "sws_getContext");
  assert!(matches!(err, Error::Configuration { .. }));
}

#[test]
fn test_filter_graph_states() {
  let graph = FilterGraph::new().unwrap();
  let volume = graph
    .create_filter(Filter::by_name("volume").unwrap(), "gain", Some("volume=0.5"))
    .unwrap();
  assert!(matches!(
    BufferSrc::new(volume, &graph),
    Err(Error::TypeMismatch { .. })
  ));

  let src = graph
    .create_filter(
      Filter::by_name("abuffer").unwrap(),
      "in",
      Some("sample_rate=8000:sample_fmt=s16:channel_layout=mono:time_base=1/8000"),
    )
    .unwrap();
  let sink = graph
    .create_filter(Filter::by_name("abuffersink").unwrap(), "out", None)
    .unwrap();
  src.link_to(volume).unwrap().link_to(sink).unwrap();

  let src = BufferSrc::new(src, &graph).unwrap();
  let sink = graph.buffer_sink(sink).unwrap();
  let mut out = OwnedFrame::new().unwrap();

  assert!(matches!(
    sink.get_frame(&mut out),
    Err(Error::InvalidState { .. })
  ));
  let mut input = tone(0, 256);
  assert!(matches!(
    src.add_frame(Some(&mut *input)),
    Err(Error::InvalidState { .. })
  ));

  graph.configure().unwrap();
  assert_eq!(sink.get_frame(&mut out).unwrap(), Outcome::RetryLater);

  src.add_frame_keep_ref(&input).unwrap();
  assert_eq!(input.nb_samples(), 256);
  src.add_frame(None).unwrap();

  let mut samples = 0;
  loop {
    match sink.get_frame(&mut out).unwrap() {
      Outcome::Ready(()) => {
        samples += out.nb_samples();
        out.unref();
      }
      Outcome::RetryLater => panic!("flushed graph asked for input"),
      Outcome::EndOfStream => break,
    }
  }
  assert_eq!(samples, 256);
  assert!(sink.get_frame(&mut out).unwrap().is_end_of_stream());
}

#[test]
fn test_rawvideo_write_then_read() {
  let dir = tempfile::tempdir().unwrap();
  let path = dir.path().join("gray.nut");
  let url = path.to_str().unwrap();
  let (width, height, count) = (16, 8, 5);

  {
    let mut enc = Encoder::by_name("rawvideo").unwrap();
    enc.set_width(width);
    enc.set_height(height);
    enc.set_pix_fmt(AVPixelFormat::GRAY8);
    enc.set_time_base(AVRational::new(1, 25));
    enc.open(None).unwrap();

    let mut writer = MediaWriter::create_with_format(url, "nut").unwrap();
    let stream = writer.new_stream(None).unwrap();
    stream.copy_params(&enc).unwrap();
    stream.set_time_base(enc.time_base());
    writer.write_header(None).unwrap();
    let out_tb = writer.stream(0).unwrap().time_base();

    let mut frame = OwnedFrame::new_video(width, height, AVPixelFormat::GRAY8, 0).unwrap();
    for pts in 0..count {
      frame.make_writable().unwrap();
      frame.plane_mut(0).unwrap().fill(pts as u8 * 10);
      frame.set_pts(pts);
      enc
        .encode(Some(&*frame), |pkt| {
          pkt.set_stream_index(0);
          pkt.rescale_ts(AVRational::new(1, 25), out_tb);
          writer.write_packet(pkt)
        })
        .unwrap();
    }
    enc
      .encode(None, |pkt| {
        pkt.set_stream_index(0);
        pkt.rescale_ts(AVRational::new(1, 25), out_tb);
        writer.write_packet(pkt)
      })
      .unwrap();
    writer.write_trailer().unwrap();
  }

  let mut reader = MediaReader::open(url).unwrap();
  assert_eq!(reader.nb_streams(), 1);
  let mut dec = {
    let stream = reader.find_best_stream(AVMediaType::Video).unwrap();
    assert_eq!(stream.codec_parameters().width(), width);
    assert_eq!(stream.codec_parameters().height(), height);
    let mut dec = stream.create_decoder().unwrap();
    dec.open(None).unwrap();
    dec
  };

  let mut firsts = Vec::new();
  let mut packet = Packet::new().unwrap();
  while reader.read_packet(&mut packet).unwrap().is_ready() {
    dec
      .decode(Some(&packet), |frame| {
        firsts.push(frame.plane(0).map_or(0, |p| p[0]));
        Ok::<(), Error>(())
      })
      .unwrap();
  }
  dec
    .decode(None, |frame| {
      firsts.push(frame.plane(0).map_or(0, |p| p[0]));
      Ok::<(), Error>(())
    })
    .unwrap();
  assert_eq!(firsts, vec![0, 10, 20, 30, 40]);
}

#[test]
fn test_wav_sample_count() {
  let dir = tempfile::tempdir().unwrap();
  let path = dir.path().join("tone.wav");
  let url = path.to_str().unwrap();

  {
    let mut enc = pcm_encoder();
    let mut writer = MediaWriter::create(url).unwrap();
    let stream = writer.new_stream(None).unwrap();
    stream.copy_params(&enc).unwrap();
    stream.set_time_base(enc.time_base());
    writer.write_header(None).unwrap();
    let (in_tb, out_tb) = (enc.time_base(), writer.stream(0).unwrap().time_base());

    for i in 0..5 {
      let frame = tone(i, 160);
      enc
        .encode(Some(&*frame), |pkt| {
          pkt.set_stream_index(0);
          pkt.rescale_ts(in_tb, out_tb);
          writer.write_packet(pkt)
        })
        .unwrap();
    }
    enc
      .encode(None, |pkt| {
        pkt.set_stream_index(0);
        pkt.rescale_ts(in_tb, out_tb);
        writer.write_packet(pkt)
      })
      .unwrap();
    writer.write_trailer().unwrap();
  }

  let reader = MediaReader::open(url).unwrap();
  let stream = reader.stream(0).unwrap();
  assert_eq!(stream.codec_parameters().sample_rate(), SAMPLE_RATE);
  assert_eq!(stream.nb_samples(), Some(800));
  reader.dump_stream(0).unwrap();
  assert!(reader.dump_stream(-1).is_err());
}
