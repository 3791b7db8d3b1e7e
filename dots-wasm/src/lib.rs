use std::cell::RefCell;
use std::rc::Rc;

use wasm_bindgen::JsCast;
use wasm_bindgen::prelude::*;
use web_sys::{Document, Element, HtmlSelectElement, Window};

use dots_core::{CircleAlgorithm, GameEvent, NodeId, Options, Puzzle, SvgTree};

mod audio;
mod utils;

use audio::AudioPlayer;
use utils::{fetch_text, log, random_index};

const BASE_PATH: &str = "/number-dots";
const SVG_NS: &str = "http://www.w3.org/2000/svg";
// icons that fail to normalize are skipped; give up after a few draws
const BUILD_ATTEMPTS: usize = 5;

struct Marker {
    label: u32,
    text: Element,
}

struct ActivePuzzle {
    puzzle: Puzzle,
    // hidden source paths, index-aligned with puzzle.paths
    path_els: Vec<Element>,
    markers: Vec<Vec<Marker>>,
    // visible prefix of the active path
    partial: Option<Element>,
}

struct State {
    window: Window,
    document: Document,
    audio: AudioPlayer,
    icon_list: Vec<String>,
    active: Option<ActivePuzzle>,
}

thread_local! {
    static STATE: RefCell<Option<Rc<RefCell<State>>>> = const { RefCell::new(None) };
}

fn with_state<T>(f: impl FnOnce(&mut State) -> T) -> Result<T, JsValue> {
    STATE.with(|st| {
        let st = st.borrow();
        let state = st
            .as_ref()
            .ok_or_else(|| JsValue::from_str("state not initialized"))?;
        Ok(f(&mut state.borrow_mut()))
    })
}

fn build_element(
    document: &Document,
    tree: &SvgTree,
    id: NodeId,
    made: &mut Vec<(NodeId, Element)>,
) -> Result<Element, JsValue> {
    let el = document.create_element_ns(Some(SVG_NS), tree.tag(id))?;
    for (name, value) in tree.attrs(id) {
        el.set_attribute(name, value)?;
    }
    for &child in tree.children(id) {
        el.append_child(&build_element(document, tree, child, made)?.into())?;
    }
    made.push((id, el.clone()));
    Ok(el)
}

fn hide_path(el: &Element) -> Result<(), JsValue> {
    let style = el.get_attribute("style").unwrap_or_default();
    el.set_attribute("style", &format!("{style};fill:none;stroke:none"))
}

fn install_puzzle(document: &Document, puzzle: Puzzle) -> Result<(), JsValue> {
    let mut made = Vec::new();
    let svg = build_element(document, &puzzle.tree, puzzle.tree.root(), &mut made)?;
    svg.set_attribute("style", "width:100%;height:100%")?;

    let mut path_els = Vec::new();
    for p in &puzzle.paths {
        let el = made
            .iter()
            .find(|(id, _)| *id == p.node)
            .map(|(_, e)| e.clone())
            .ok_or_else(|| JsValue::from_str("path element missing"))?;
        hide_path(&el)?;
        path_els.push(el);
    }

    let font_size = puzzle.font_size;
    let mut markers = Vec::new();
    for (i, p) in puzzle.paths.iter().enumerate() {
        let mut row = Vec::new();
        for m in &p.markers {
            let text = document.create_element_ns(Some(SVG_NS), "text")?;
            text.set_attribute("x", &m.rect.center_x().to_string())?;
            text.set_attribute("y", &(m.rect.top + font_size).to_string())?;
            text.set_attribute("text-anchor", "middle")?;
            text.set_attribute("font-size", &font_size.to_string())?;
            let display = if i == 0 { "initial" } else { "none" };
            text.set_attribute("style", &format!("display:{display};cursor:pointer"))?;
            text.set_attribute("data-label", &m.label.to_string())?;
            text.set_text_content(Some(&m.label.to_string()));
            svg.append_child(&text)?;
            row.push(Marker {
                label: m.label,
                text,
            });
        }
        markers.push(row);
    }

    // one delegated handler; the state machine holds no UI references
    let onclick = Closure::<dyn FnMut(web_sys::Event)>::wrap(Box::new(|event: web_sys::Event| {
        let label = event
            .target()
            .and_then(|t| t.dyn_into::<Element>().ok())
            .and_then(|el| el.get_attribute("data-label"))
            .and_then(|v| v.parse::<u32>().ok());
        if let Some(label) = label {
            handle_click(label);
        }
    }));
    svg.add_event_listener_with_callback("click", onclick.as_ref().unchecked_ref())?;
    onclick.forget();

    let container = document
        .get_element_by_id("iconContainer")
        .ok_or_else(|| JsValue::from_str("#iconContainer not found"))?;
    container.replace_children_with_node_1(&svg);

    with_state(|s| {
        s.active = Some(ActivePuzzle {
            puzzle,
            path_els,
            markers,
            partial: None,
        });
    })
}

fn handle_click(label: u32) {
    match with_state(|s| process_click(s, label)) {
        Ok(Ok(())) => {}
        Ok(Err(err)) | Err(err) => log(&format!("marker click failed: {err:?}")),
    }
}

fn process_click(s: &mut State, label: u32) -> Result<(), JsValue> {
    let Some(active) = s.active.as_mut() else {
        return Ok(());
    };
    // settled markers go quiet instead of replaying the error sound
    if label < active.puzzle.next_label() {
        return Ok(());
    }
    match active.puzzle.click(label) {
        GameEvent::MarkerRejected => s.audio.play("error"),
        GameEvent::SegmentRevealed { path } => {
            reveal(&s.document, active, path)?;
            settle_marker(active, path, label)?;
            s.audio.play("correct1");
        }
        GameEvent::PathCompleted { path, next } => {
            reveal(&s.document, active, path)?;
            // the fully drawn path stays in the document
            active.partial = None;
            clear_markers(active, path);
            show_markers(active, next)?;
            s.audio.play("correct2");
        }
        GameEvent::PuzzleCompleted { path } => {
            reveal(&s.document, active, path)?;
            active.partial = None;
            clear_markers(active, path);
            s.audio.play("correctAll");
        }
    }
    Ok(())
}

/// Swap the previous partial path for one carrying the longer prefix. The
/// replacement copies the source path's attributes so fill and stroke come
/// back exactly as the icon defined them.
fn reveal(document: &Document, active: &mut ActivePuzzle, path: usize) -> Result<(), JsValue> {
    if let Some(old) = active.partial.take() {
        old.remove();
    }
    let node = active.puzzle.paths[path].node;
    let el = document.create_element_ns(Some(SVG_NS), "path")?;
    for (name, value) in active.puzzle.tree.attrs(node) {
        el.set_attribute(name, value)?;
    }
    let data = active
        .puzzle
        .revealed_data(path)
        .ok_or_else(|| JsValue::from_str("path index out of range"))?;
    el.set_attribute("d", &data.to_string())?;
    active.path_els[path].after_with_node_1(&el)?;
    active.partial = Some(el);
    Ok(())
}

fn settle_marker(active: &ActivePuzzle, path: usize, label: u32) -> Result<(), JsValue> {
    if let Some(marker) = active.markers[path].iter().find(|m| m.label == label) {
        marker.text.set_attribute("fill-opacity", "0.5")?;
        marker
            .text
            .set_attribute("style", "display:initial;cursor:initial")?;
    }
    Ok(())
}

fn clear_markers(active: &mut ActivePuzzle, path: usize) {
    for marker in active.markers[path].drain(..) {
        marker.text.remove();
    }
}

fn show_markers(active: &ActivePuzzle, path: usize) -> Result<(), JsValue> {
    for marker in &active.markers[path] {
        marker
            .text
            .set_attribute("style", "display:initial;cursor:pointer")?;
    }
    Ok(())
}

fn selected_course(document: &Document) -> Result<String, JsValue> {
    document
        .get_element_by_id("course")
        .and_then(|el| el.dyn_into::<HtmlSelectElement>().ok())
        .map(|sel| sel.value())
        .ok_or_else(|| JsValue::from_str("#course selector not found"))
}

fn select_random_course(document: &Document) {
    let Some(sel) = document
        .get_element_by_id("course")
        .and_then(|el| el.dyn_into::<HtmlSelectElement>().ok())
    else {
        return;
    };
    if sel.length() == 0 {
        return;
    }
    let index = random_index(sel.length() as usize);
    sel.set_selected_index(index as i32);
    select_attribution(document, index);
}

fn select_attribution(document: &Document, index: usize) {
    let Some(attribution) = document.get_element_by_id("attribution") else {
        return;
    };
    let divs = attribution.children();
    for i in 0..divs.length() {
        let Some(div) = divs.item(i) else { continue };
        if i as usize == index {
            let _ = div.class_list().remove_1("d-none");
        } else {
            let _ = div.class_list().add_1("d-none");
        }
    }
}

async fn next_problem() -> Result<(), JsValue> {
    let (window, document) = with_state(|s| (s.window.clone(), s.document.clone()))?;
    let course = selected_course(&document)?;
    let mut icon_list = with_state(|s| s.icon_list.clone())?;
    if icon_list.is_empty() {
        let text = fetch_text(&window, &format!("{BASE_PATH}/data/{course}.txt")).await?;
        icon_list = text.trim_end().lines().map(str::to_string).collect();
        let list = icon_list.clone();
        with_state(|s| s.icon_list = list)?;
    }
    if icon_list.is_empty() {
        return Err(JsValue::from_str("icon list is empty"));
    }
    let options = Options {
        circle_algorithm: CircleAlgorithm::QuadBezier,
        circle_segments: 8,
    };
    for _ in 0..BUILD_ATTEMPTS {
        let file = &icon_list[random_index(icon_list.len())];
        let url = format!("/svg/{course}/{file}");
        let text = fetch_text(&window, &url).await?;
        match Puzzle::build(&text, &options) {
            Ok(puzzle) => return install_puzzle(&document, puzzle),
            Err(err) => log(&format!("skipping {url}: {err}")),
        }
    }
    Err(JsValue::from_str("no playable icon found"))
}

fn schedule_next_problem() {
    wasm_bindgen_futures::spawn_local(async {
        if let Err(err) = next_problem().await {
            log(&format!("failed to load the next icon: {err:?}"));
        }
    });
}

async fn reload_course() -> Result<(), JsValue> {
    let (window, document) = with_state(|s| (s.window.clone(), s.document.clone()))?;
    let course = selected_course(&document)?;
    let text = fetch_text(&window, &format!("{BASE_PATH}/data/{course}.txt")).await?;
    let list: Vec<String> = text.trim_end().lines().map(str::to_string).collect();
    with_state(|s| s.icon_list = list)?;
    if let Some(sel) = document
        .get_element_by_id("course")
        .and_then(|el| el.dyn_into::<HtmlSelectElement>().ok())
    {
        select_attribution(&document, sel.selected_index().max(0) as usize);
    }
    next_problem().await
}

fn load_config(window: &Window, document: &Document) {
    let Ok(Some(storage)) = window.local_storage() else {
        return;
    };
    if storage.get_item("darkMode").ok().flatten().as_deref() == Some("1")
        && let Some(root) = document.document_element()
    {
        let _ = root.set_attribute("data-bs-theme", "dark");
    }
}

fn toggle_dark_mode(window: &Window, document: &Document) {
    let Ok(Some(storage)) = window.local_storage() else {
        return;
    };
    let Some(root) = document.document_element() else {
        return;
    };
    let dark = storage.get_item("darkMode").ok().flatten().as_deref() == Some("1");
    let (flag, theme) = if dark { ("0", "light") } else { ("1", "dark") };
    let _ = storage.set_item("darkMode", flag);
    let _ = root.set_attribute("data-bs-theme", theme);
}

fn change_lang(window: &Window, document: &Document) {
    let Some(sel) = document
        .get_element_by_id("lang")
        .and_then(|el| el.dyn_into::<HtmlSelectElement>().ok())
    else {
        return;
    };
    let lang = sel.value();
    let _ = window.location().set_href(&format!("{BASE_PATH}/{lang}/"));
}

fn attach_ui(state: &Rc<RefCell<State>>) -> Result<(), JsValue> {
    let document = state.borrow().document.clone();

    if let Some(btn) = document.get_element_by_id("toggleDarkMode") {
        let st = state.clone();
        let onclick = Closure::<dyn FnMut()>::wrap(Box::new(move || {
            let s = st.borrow();
            toggle_dark_mode(&s.window, &s.document);
        }));
        btn.add_event_listener_with_callback("click", onclick.as_ref().unchecked_ref())?;
        onclick.forget();
    }

    if let Some(sel) = document.get_element_by_id("lang") {
        let st = state.clone();
        let onchange = Closure::<dyn FnMut()>::wrap(Box::new(move || {
            let s = st.borrow();
            change_lang(&s.window, &s.document);
        }));
        sel.add_event_listener_with_callback("change", onchange.as_ref().unchecked_ref())?;
        onchange.forget();
    }

    if let Some(btn) = document.get_element_by_id("startButton") {
        let onclick = Closure::<dyn FnMut()>::wrap(Box::new(schedule_next_problem));
        btn.add_event_listener_with_callback("click", onclick.as_ref().unchecked_ref())?;
        onclick.forget();
    }

    if let Some(sel) = document.get_element_by_id("course") {
        let onchange = Closure::<dyn FnMut()>::wrap(Box::new(|| {
            wasm_bindgen_futures::spawn_local(async {
                if let Err(err) = reload_course().await {
                    log(&format!("failed to change course: {err:?}"));
                }
            });
        }));
        sel.add_event_listener_with_callback("change", onchange.as_ref().unchecked_ref())?;
        onchange.forget();
    }

    // the audio context can only start after a user gesture
    {
        let st = state.clone();
        let unlock = Closure::<dyn FnMut()>::wrap(Box::new(move || {
            st.borrow().audio.unlock();
        }));
        let options = web_sys::AddEventListenerOptions::new();
        options.set_once(true);
        options.set_capture(true);
        document.add_event_listener_with_callback_and_add_event_listener_options(
            "click",
            unlock.as_ref().unchecked_ref(),
            &options,
        )?;
        unlock.forget();
    }

    Ok(())
}

#[wasm_bindgen(start)]
pub fn start() -> Result<(), JsValue> {
    let window = web_sys::window().ok_or("no window")?;
    let document = window.document().ok_or("no document")?;
    load_config(&window, &document);

    let audio = AudioPlayer::new()?;
    audio.preload(&window);

    let state = Rc::new(RefCell::new(State {
        window,
        document: document.clone(),
        audio,
        icon_list: Vec::new(),
        active: None,
    }));
    STATE.with(|st| st.replace(Some(state.clone())));

    select_random_course(&document);
    attach_ui(&state)?;
    schedule_next_problem();
    Ok(())
}
