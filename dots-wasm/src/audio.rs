use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

use wasm_bindgen::{JsCast, JsValue};
use wasm_bindgen_futures::JsFuture;
use web_sys::{AudioBuffer, AudioContext, Window};

use crate::BASE_PATH;
use crate::utils::log;

const SOUNDS: &[(&str, &str)] = &[
    ("error", "boyon1.mp3"),
    ("correct1", "pa1.mp3"),
    ("correct2", "papa1.mp3"),
    ("correctAll", "levelup1.mp3"),
];

/// Decoded sound effects behind a shared cache. Cloning is cheap; every
/// clone plays through the same `AudioContext`.
#[derive(Clone)]
pub struct AudioPlayer {
    context: AudioContext,
    buffers: Rc<RefCell<HashMap<&'static str, AudioBuffer>>>,
}

impl AudioPlayer {
    pub fn new() -> Result<AudioPlayer, JsValue> {
        Ok(AudioPlayer {
            context: AudioContext::new()?,
            buffers: Rc::default(),
        })
    }

    /// Fetch and decode every sound up front so feedback is instant later.
    pub fn preload(&self, window: &Window) {
        for &(name, _) in SOUNDS {
            let player = self.clone();
            let window = window.clone();
            wasm_bindgen_futures::spawn_local(async move {
                if let Err(err) = player.load(&window, name).await {
                    log(&format!("failed to load sound {name}: {err:?}"));
                }
            });
        }
    }

    async fn load(&self, window: &Window, name: &'static str) -> Result<(), JsValue> {
        if self.buffers.borrow().contains_key(name) {
            return Ok(());
        }
        let file = SOUNDS
            .iter()
            .find(|(n, _)| *n == name)
            .map(|(_, f)| *f)
            .ok_or_else(|| JsValue::from_str("unknown sound"))?;
        let url = format!("{BASE_PATH}/mp3/{file}");
        let response: web_sys::Response =
            JsFuture::from(window.fetch_with_str(&url)).await?.dyn_into()?;
        let data = JsFuture::from(response.array_buffer()?).await?;
        let buffer: AudioBuffer =
            JsFuture::from(self.context.decode_audio_data(&data.dyn_into()?)?)
                .await?
                .dyn_into()?;
        self.buffers.borrow_mut().insert(name, buffer);
        Ok(())
    }

    /// Browsers keep the context suspended until the first user gesture.
    pub fn unlock(&self) {
        let _ = self.context.resume();
    }

    /// Play a preloaded sound. A sound that has not finished decoding yet is
    /// skipped silently rather than delaying the interaction.
    pub fn play(&self, name: &'static str) {
        if let Some(buffer) = self.buffers.borrow().get(name) {
            if let Err(err) = self.play_buffer(buffer) {
                log(&format!("failed to play sound {name}: {err:?}"));
            }
        }
    }

    fn play_buffer(&self, buffer: &AudioBuffer) -> Result<(), JsValue> {
        let source = self.context.create_buffer_source()?;
        source.set_buffer(Some(buffer));
        source.connect_with_audio_node(&self.context.destination())?;
        source.start()
    }
}
