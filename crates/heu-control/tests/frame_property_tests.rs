use heu_control::hue::command::{parse_line, render_line, Command};
use heu_control::hue::stream::protocol::{
    decode_frame, ColorSpace, FrameBuilder, FrameError, CHANNEL_ENTRY_SIZE, MAX_CHANNELS,
    PREAMBLE_SIZE,
};
use palette::Srgb;
use proptest::prelude::*;

const SESSION_ID: &[u8] = b"1a8d99cc-967b-44f2-9202-43f976c0fa6b";

fn rgb((r, g, b): (u8, u8, u8)) -> Srgb {
    Srgb::new(r, g, b).into_format()
}

fn command_strategy() -> impl Strategy<Value = Command> {
    (proptest::option::of(any::<u8>()), any::<(u8, u8, u8)>()).prop_map(|(channel, color)| {
        match channel {
            Some(id) => Command::channel(id, rgb(color)),
            None => Command::broadcast(rgb(color)),
        }
    })
}

fn builder() -> FrameBuilder {
    let mut builder = FrameBuilder::new(ColorSpace::Rgb);
    builder.write_preamble(SESSION_ID).unwrap();
    builder
}

proptest! {
    #[test]
    fn rendered_commands_parse_back(commands in proptest::collection::vec(command_strategy(), 1..12)) {
        let line = render_line(&commands);
        let parsed = parse_line(&line).unwrap();
        prop_assert_eq!(parsed, commands);
    }

    #[test]
    fn built_frame_decodes_to_written_entries(
        writes in proptest::collection::vec((any::<u8>(), any::<(u8, u8, u8)>()), 0..=MAX_CHANNELS)
    ) {
        let mut builder = builder();
        for (channel_id, color) in &writes {
            builder.write_channel_color(*channel_id, rgb(*color)).unwrap();
        }

        let frame = builder.build();
        prop_assert_eq!(frame.len(), PREAMBLE_SIZE + CHANNEL_ENTRY_SIZE * writes.len());

        let decoded = decode_frame(frame).unwrap();
        prop_assert_eq!(decoded.entries.len(), writes.len());
        prop_assert_eq!(decoded.session_id.as_bytes(), SESSION_ID);
        for (entry, (channel_id, (r, g, b))) in decoded.entries.iter().zip(&writes) {
            prop_assert_eq!(entry.channel_id, *channel_id);
            for (component, byte) in entry.components.iter().zip([r, g, b]) {
                let expected = i32::from(*byte) * 257;
                prop_assert!((i32::from(*component) - expected).abs() <= 1);
            }
        }
    }

    #[test]
    fn overflow_leaves_frame_untouched(channel_id in any::<u8>(), color in any::<(u8, u8, u8)>()) {
        let mut builder = builder();
        for id in 0..MAX_CHANNELS as u8 {
            builder.write_channel_color(id, rgb(color)).unwrap();
        }
        let before = builder.build().to_vec();

        let result = builder.write_channel_color(channel_id, rgb(color));
        prop_assert_eq!(result, Err(FrameError::TooManyChannels { max: MAX_CHANNELS }));
        prop_assert_eq!(builder.build(), before.as_slice());
    }

    #[test]
    fn reset_restores_preamble(count in 0..=MAX_CHANNELS) {
        let mut builder = builder();
        let preamble = builder.build().to_vec();
        for id in 0..count as u8 {
            builder.write_channel_color(id, rgb((255, 255, 255))).unwrap();
        }

        builder.reset_body();
        prop_assert_eq!(builder.build(), preamble.as_slice());
        prop_assert_eq!(builder.build().len(), PREAMBLE_SIZE);
    }
}
