use crate::utils::*;
use memento_core::LeaderboardEntry;
use yew::prelude::*;

/// `name / attempts / time s / size`
pub(crate) fn entry_line(entry: &LeaderboardEntry) -> String {
    format!(
        "{} / {} / {}s / {}",
        entry.player_name(),
        entry.attempts(),
        format_secs(entry.time_secs()),
        entry.board_size()
    )
}

#[derive(Properties, PartialEq)]
pub(crate) struct CompletedProps {
    pub attempts: u32,
    pub time_secs: f64,
    pub entries: Vec<LeaderboardEntry>,
    /// 1-based rank of this game in `entries`
    #[prop_or_default]
    pub rank: Option<usize>,
}

#[function_component]
pub(crate) fn CompletedView(props: &CompletedProps) -> Html {
    html! {
        <section class="completed">
            <h2>{"Completed!"}</h2>
            <p class="attempts">{format!("Attempts: {}", props.attempts)}</p>
            <p class="time">{format!("Time: {}s", format_secs(props.time_secs))}</p>
            <ol>
                {
                    for props.entries.iter().enumerate().map(|(i, entry)| {
                        let class = (props.rank == Some(i + 1)).then_some("new");
                        html! { <li {class}>{entry_line(entry)}</li> }
                    })
                }
            </ol>
        </section>
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use memento_core::BoardSize;

    #[test]
    fn entry_line_matches_listing_format() {
        let entry = LeaderboardEntry::new("Ada", 9, 21.5, BoardSize::new(2, 4).unwrap()).unwrap();
        assert_eq!(entry_line(&entry), "Ada / 9 / 21.50s / 2x4");
    }
}
