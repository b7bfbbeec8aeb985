use crate::scores::CompletedView;
use crate::settings::{self, Settings};
use crate::store::{self, BrowserLeaderboard};
use crate::utils::*;
use clap::Args;
use gloo::timers::callback::{Interval, Timeout};
use memento_core as game;
use std::sync::Arc;
use web_time::Instant;
use yew::prelude::*;

type Session = game::MatchSession<BrowserLeaderboard>;

#[derive(Clone, Debug, PartialEq)]
pub(crate) enum Msg {
    Select(game::TileIndex),
    Resolve(game::ResolutionTicket),
    UpdateTime,
    NewGame,
    ToggleSettings,
    ApplySettings(Settings),
    Recorded(u64, game::RecordOutcome),
}

/// CSS classes for a tile; face-up and matched tiles show their pair.
fn tile_classes(tile: game::Tile, locked: bool) -> Classes {
    let mut class = classes!("tile");
    if tile.face_up || tile.matched {
        class.push("up");
        class.push(format!("pair-{}", tile.pair_key));
    }
    if tile.matched {
        class.push("matched");
    }
    if locked {
        class.push("locked");
    }
    class
}

fn phase_class(phase: game::EnginePhase) -> &'static str {
    use game::EnginePhase::*;
    match phase {
        Idle => "not-started",
        Awaiting => "in-progress",
        Resolving => "resolving",
        Completed => "win",
    }
}

#[derive(Properties, Clone, PartialEq)]
struct TileProps {
    index: game::TileIndex,
    tile: game::Tile,
    #[prop_or_default]
    locked: bool,
    callback: Callback<game::TileIndex>,
}

#[function_component(TileView)]
fn tile_component(props: &TileProps) -> Html {
    let TileProps {
        index,
        tile,
        locked,
        callback,
    } = props.clone();

    let class = tile_classes(tile, locked);
    let onclick = Callback::from(move |_: MouseEvent| {
        log::trace!("tile {} clicked", index);
        callback.emit(index);
    });

    html! {
        <td {class} {onclick}/>
    }
}

#[derive(Args, Properties, Debug, Clone, Default, PartialEq)]
pub(crate) struct GameProps {
    /// Force a seed instead of random
    #[arg(short, long)]
    seed: Option<u64>,

    /// Force a board size such as 2x4
    #[arg(long)]
    size: Option<game::BoardSize>,
}

pub(crate) struct GameView {
    settings: Settings,
    leaderboard: Arc<game::Leaderboard<BrowserLeaderboard>>,
    session: Option<Session>,
    prev_time: String,
    settings_open: bool,
    _resolve_timeout: Option<Timeout>,
    _timer_interval: Interval,
}

impl GameView {
    fn create_session(
        leaderboard: &Arc<game::Leaderboard<BrowserLeaderboard>>,
        settings: &Settings,
        seed: u64,
    ) -> Option<Session> {
        let config = game::GameConfig::new(settings.size);
        match game::MatchSession::new(
            Arc::clone(leaderboard),
            settings.player_name.clone(),
            seed,
            config,
        ) {
            Ok(session) => Some(session.with_deferred_recording()),
            Err(err) => {
                log::error!("Could not start game: {}", err);
                None
            }
        }
    }

    fn create_timer(ctx: &Context<Self>) -> Interval {
        let link = ctx.link().clone();
        Interval::new(100, move || link.send_message(Msg::UpdateTime))
    }

    fn get_time(&self) -> String {
        let secs = self
            .session
            .as_ref()
            .map_or(0.0, |session| session.elapsed_secs(Instant::now()));
        format_secs(secs)
    }

    fn select_tile(&mut self, ctx: &Context<Self>, index: game::TileIndex) -> bool {
        let Some(session) = self.session.as_mut() else {
            return false;
        };

        match session.select_tile(index, Instant::now()) {
            Ok(outcome) => {
                if let Some(pending) = outcome.pending() {
                    let link = ctx.link().clone();
                    let millis = u32::try_from(pending.delay.as_millis()).unwrap_or(u32::MAX);
                    self._resolve_timeout = Some(Timeout::new(millis, move || {
                        link.send_message(Msg::Resolve(pending.ticket))
                    }));
                }
                if let Some(entry) = session.take_unrecorded() {
                    let link = ctx.link().clone();
                    let epoch = session.epoch();
                    store::record_exclusive(Arc::clone(&self.leaderboard), entry, move |recorded| {
                        match recorded {
                            Ok(outcome) => link.send_message(Msg::Recorded(epoch, outcome)),
                            Err(err) => log::warn!("score not recorded: {}", err),
                        }
                    });
                }
                outcome.has_update()
            }
            Err(err) => {
                log::error!("Could not select tile {}: {}", index, err);
                false
            }
        }
    }

    fn new_game(&mut self) -> bool {
        // dropping the timeout cancels a flip-back still pending for the old board
        self._resolve_timeout = None;
        let size = self.settings.size;
        match self.session.as_mut() {
            Some(session) => {
                if let Err(err) = session.reset_game(size.rows(), size.cols()) {
                    log::error!("Could not reset game: {}", err);
                }
            }
            None => {
                self.session =
                    Self::create_session(&self.leaderboard, &self.settings, js_random_seed());
            }
        }
        true
    }

    fn apply_settings(&mut self, settings: Settings) -> bool {
        settings.local_save();
        let size_changed = settings.size != self.settings.size;
        self.settings = settings;
        self.settings_open = false;

        if let Some(session) = self.session.as_mut() {
            session.set_player_name(self.settings.player_name.clone());
        }
        if size_changed {
            self.new_game();
        }
        true
    }

    fn view_board(&self, ctx: &Context<Self>, snapshot: &game::GameSnapshot) -> Html {
        let (rows, cols): game::Coord2 = snapshot.size.into();
        let playable = snapshot.phase.accepts_selection();

        html! {
            <table class={playable.then_some("playable")}>
                {
                    for (0..rows).map(|row| html! {
                        <tr>
                            {
                                for (0..cols).map(|col| {
                                    let index = snapshot.size.index_of((row, col));
                                    let tile = snapshot.tiles[usize::from(index)];
                                    let locked = !playable || !tile.is_selectable();
                                    let callback = ctx.link().callback(Msg::Select);
                                    html! {
                                        <TileView {index} {tile} {locked} {callback}/>
                                    }
                                })
                            }
                        </tr>
                    })
                }
            </table>
        }
    }

    fn view_completed(&self) -> Html {
        let Some(session) = self.session.as_ref() else {
            return html! {};
        };
        let Some(score) = session.engine().final_score() else {
            return html! {};
        };

        let (entries, rank) = match session.last_record() {
            Some(record) => (record.entries.clone(), record.rank),
            None => (session.leaderboard(), None),
        };

        html! {
            <CompletedView attempts={score.attempts} time_secs={score.time_secs()} {entries} {rank}/>
        }
    }
}

impl Component for GameView {
    type Message = Msg;
    type Properties = GameProps;

    fn create(ctx: &Context<Self>) -> Self {
        let props = ctx.props();
        let mut settings: Settings = LocalOrDefault::local_or_default();
        if let Some(size) = props.size {
            settings.size = size;
        }
        let seed = props.seed.unwrap_or_else(js_random_seed);
        log::debug!("seed: {}", seed);

        let leaderboard = Arc::new(game::Leaderboard::new(BrowserLeaderboard));
        let session = Self::create_session(&leaderboard, &settings, seed);

        Self {
            settings,
            leaderboard,
            session,
            prev_time: format_secs(0.0),
            settings_open: false,
            _resolve_timeout: None,
            _timer_interval: GameView::create_timer(ctx),
        }
    }

    fn update(&mut self, ctx: &Context<Self>, msg: Self::Message) -> bool {
        use Msg::*;

        match msg {
            Select(index) => {
                log::debug!("select tile: {}", index);
                self.select_tile(ctx, index)
            }
            Resolve(ticket) => {
                self._resolve_timeout = None;
                self.session
                    .as_mut()
                    .is_some_and(|session| session.resolve(ticket).has_update())
            }
            UpdateTime => {
                let time = self.get_time();
                if self.prev_time != time {
                    self.prev_time = time;
                    true
                } else {
                    false
                }
            }
            NewGame => self.new_game(),
            ToggleSettings => {
                self.settings_open = !self.settings_open;
                true
            }
            ApplySettings(settings) => self.apply_settings(settings),
            Recorded(epoch, outcome) => {
                log::debug!("recorded score, rank {:?}", outcome.rank);
                match self.session.as_mut() {
                    Some(session) => {
                        session.set_record(epoch, outcome);
                        true
                    }
                    None => false,
                }
            }
        }
    }

    fn view(&self, ctx: &Context<Self>) -> Html {
        use settings::SettingsView;
        use Msg::*;

        let Some(session) = self.session.as_ref() else {
            return html! {
                <div class="memento">
                    <p>{"The game could not be started."}</p>
                </div>
            };
        };

        let snapshot = session.snapshot(Instant::now());
        let game_state_class = classes!(phase_class(snapshot.phase));
        let attempts = format!("{:03}", snapshot.attempts.min(999));
        let elapsed_time = format_secs(snapshot.elapsed_secs);

        let cb_new_game = ctx.link().callback(|e: MouseEvent| {
            e.stop_propagation();
            NewGame
        });
        let cb_show_settings = ctx.link().callback(|_| ToggleSettings);
        let on_apply = ctx.link().callback(ApplySettings);
        let on_cancel = ctx.link().callback(|_| ToggleSettings);

        html! {
            <div class="memento">
                <small onclick={cb_show_settings}>{"···"}</small>
                <nav>
                    <aside>{attempts}</aside>
                    <span><button class={game_state_class} onclick={cb_new_game}/></span>
                    <aside>{elapsed_time}</aside>
                </nav>
                {self.view_board(ctx, &snapshot)}
                {self.view_completed()}
                if self.settings_open {
                    <SettingsView settings={self.settings.clone()} {on_apply} {on_cancel}/>
                }
            </div>
        }
    }
}
