use crate::utils::*;
use memento_core::{BoardSize, DEFAULT_PLAYER_NAME, MAX_PLAYER_NAME_LEN};
use serde::{Deserialize, Serialize};
use web_sys::{HtmlInputElement, HtmlSelectElement};
use yew::TargetCast;
use yew::prelude::*;

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub(crate) struct Settings {
    pub player_name: String,
    pub size: BoardSize,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            player_name: DEFAULT_PLAYER_NAME.to_owned(),
            size: BoardSize::default(),
        }
    }
}

impl StorageKey for Settings {
    const KEY: &'static str = "memento:settings";
}

#[derive(Properties, PartialEq)]
pub(crate) struct SettingsProps {
    pub settings: Settings,
    pub on_apply: Callback<Settings>,
    pub on_cancel: Callback<()>,
}

#[function_component]
pub(crate) fn SettingsView(props: &SettingsProps) -> Html {
    let draft = use_state(|| props.settings.clone());

    let oninput = {
        let draft = draft.clone();
        Callback::from(move |e: InputEvent| {
            let input: HtmlInputElement = e.target_unchecked_into();
            let mut next = (*draft).clone();
            next.player_name = input.value();
            draft.set(next);
        })
    };

    let onchange = {
        let draft = draft.clone();
        Callback::from(move |e: Event| {
            let select: HtmlSelectElement = e.target_unchecked_into();
            match select.value().parse() {
                Ok(size) => {
                    let mut next = (*draft).clone();
                    next.size = size;
                    draft.set(next);
                }
                Err(err) => log::warn!("ignored board size {:?}: {}", select.value(), err),
            }
        })
    };

    let onapply = {
        let draft = draft.clone();
        let on_apply = props.on_apply.clone();
        Callback::from(move |_: MouseEvent| on_apply.emit((*draft).clone()))
    };
    let on_cancel = props.on_cancel.clone();

    html! {
        <dialog id="settings" open={true}>
            <article>
                <h2>{"Settings"}</h2>
                <label>
                    {"Name"}
                    <input
                        type="text"
                        maxlength={MAX_PLAYER_NAME_LEN.to_string()}
                        value={draft.player_name.clone()}
                        {oninput}
                    />
                </label>
                <label>
                    {"Board"}
                    <select {onchange}>
                        {
                            for BoardSize::PRESETS.iter().map(|size| html! {
                                <option value={size.to_string()} selected={*size == draft.size}>
                                    {size.to_string()}
                                </option>
                            })
                        }
                    </select>
                </label>
                <footer>
                    <button onclick={move |_| on_cancel.emit(())} type="reset">{"Cancel"}</button>
                    <button onclick={onapply}>{"Apply"}</button>
                </footer>
            </article>
        </dialog>
    }
}
