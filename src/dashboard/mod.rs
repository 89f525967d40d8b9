use axum::{
    extract::State,
    http::StatusCode,
    response::{Html, IntoResponse},
    routing::{get, post},
    Json, Router,
};
use serde::Serialize;
use serde_json::json;
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tracing::{error, info};

use crate::artifacts::{ArtifactCache, ArtifactStore};
use crate::chase::{render, MatchState, PredictError, Predictor};

/// Initial form values, same as the entry form's defaults.
const DEFAULT_TARGET: i64 = 160;
const DEFAULT_SCORE: i64 = 82;
const DEFAULT_OVERS: i64 = 11;
const DEFAULT_WICKETS: i64 = 2;

#[derive(Clone)]
pub struct AppState {
    pub artifacts: ArtifactCache,
}

type ApiError = (StatusCode, Json<serde_json::Value>);

#[derive(Debug, Serialize)]
struct Options {
    teams: Vec<String>,
    cities: Vec<String>,
    defaults: MatchState,
}

/// Build the Axum router for the prediction form.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/", get(index_handler))
        .route("/health", get(health_handler))
        .route("/api/options", get(options_handler))
        .route("/api/predict", post(predict_handler))
        .layer(CorsLayer::permissive())
        .with_state(Arc::new(state))
}

async fn store(state: &AppState) -> Result<Arc<ArtifactStore>, ApiError> {
    state.artifacts.get().await.map_err(|e| {
        error!("Artifacts unavailable: {}", e);
        (
            StatusCode::SERVICE_UNAVAILABLE,
            Json(json!({ "error": e.to_string(), "files": e.files() })),
        )
    })
}

/// Serve the single-page form.
async fn index_handler() -> impl IntoResponse {
    Html(INDEX_HTML)
}

/// GET /health
async fn health_handler(
    State(state): State<Arc<AppState>>,
) -> Result<impl IntoResponse, ApiError> {
    let store = store(&state).await?;
    let catalog = store.catalog();
    Ok(Json(json!({
        "status": "ok",
        "model": store.classifier().name(),
        "version": store.classifier().version(),
        "teams": catalog.team_count(),
        "cities": catalog.city_count(),
    })))
}

/// GET /api/options
async fn options_handler(
    State(state): State<Arc<AppState>>,
) -> Result<impl IntoResponse, ApiError> {
    let store = store(&state).await?;
    let catalog = store.catalog();
    let teams: Vec<String> = catalog.teams().map(str::to_string).collect();
    let cities: Vec<String> = catalog.cities().map(str::to_string).collect();

    let defaults = MatchState {
        batting_team: teams.first().cloned().unwrap_or_default(),
        bowling_team: teams
            .get(1)
            .or(teams.first())
            .cloned()
            .unwrap_or_default(),
        city: cities.first().cloned().unwrap_or_default(),
        target: DEFAULT_TARGET,
        score: DEFAULT_SCORE,
        overs_completed: DEFAULT_OVERS,
        wickets_fallen: DEFAULT_WICKETS,
    };

    Ok(Json(Options {
        teams,
        cities,
        defaults,
    }))
}

/// POST /api/predict
async fn predict_handler(
    State(state): State<Arc<AppState>>,
    Json(match_state): Json<MatchState>,
) -> Result<impl IntoResponse, ApiError> {
    let store = store(&state).await?;
    let predictor = Predictor::new(store);

    match predictor.evaluate(&match_state) {
        Ok(prediction) => {
            let report = render(&prediction);
            info!(
                "{} chasing {} vs {}: {:.1}% / {:.1}%",
                match_state.batting_team,
                match_state.target,
                match_state.bowling_team,
                report.batting.percent,
                report.bowling.percent
            );
            Ok(Json(report))
        }
        Err(PredictError::Invalid(problems)) => {
            let errors: Vec<String> = problems.iter().map(ToString::to_string).collect();
            Err((
                StatusCode::UNPROCESSABLE_ENTITY,
                Json(json!({ "errors": errors })),
            ))
        }
        Err(PredictError::Inference(failure)) => Err((
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(json!({
                "error": failure.to_string(),
                "model": failure.model,
                "model_input": failure.row,
            })),
        )),
    }
}

/// Embedded single-file form (HTML + CSS + JS)
const INDEX_HTML: &str = r#"<!DOCTYPE html>
<html lang="en">
<head>
<meta charset="UTF-8">
<meta name="viewport" content="width=device-width, initial-scale=1.0">
<title>IPL Win Probability</title>
<style>
  :root {
    --bg: #f5f7fb;
    --card: rgba(255,255,255,.85);
    --border: rgba(0,0,0,.08);
    --primary: #5B8DEF;
    --green: #2BA84A;
    --red: #E74C3C;
    --muted: #8892a0;
  }
  * { box-sizing: border-box; margin: 0; padding: 0; }
  body { background: var(--bg); color: #1f2430; font-family: 'Segoe UI', system-ui, sans-serif; }
  main { max-width: 1100px; margin: 0 auto; padding: 1.5rem 2rem; display: grid; gap: 1.25rem; }
  h1 { font-size: 2rem; font-weight: 800; }
  .subtitle { color: var(--muted); }
  .card { background: var(--card); border: 1px solid var(--border); border-radius: 14px; padding: 1rem 1.25rem; }
  .row { display: grid; gap: 1rem; }
  .row.three { grid-template-columns: repeat(3, 1fr); }
  .row.four { grid-template-columns: repeat(4, 1fr); }
  .row.two { grid-template-columns: 1fr 1fr; }
  @media (max-width: 768px) { .row.three, .row.four, .row.two { grid-template-columns: 1fr; } }
  label { display: block; color: var(--muted); font-size: .85rem; margin-bottom: .3rem; }
  select, input { width: 100%; padding: .5rem .6rem; border: 1px solid var(--border); border-radius: 8px; font-size: 1rem; background: #fff; }
  button { width: 100%; padding: .7rem; border: none; border-radius: 10px; background: var(--primary); color: #fff; font-size: 1rem; font-weight: 700; cursor: pointer; }
  .kpi-title { color: var(--muted); font-size: .9rem; margin-bottom: .25rem; }
  .kpi-value { font-size: 1.6rem; font-weight: 700; }
  .pill { display: inline-block; padding: .2rem .6rem; border-radius: 999px; font-size: .8rem; border: 1px solid var(--border); color: var(--muted); margin-left: .3rem; }
  .prob-label { font-weight: 700; margin-bottom: .4rem; }
  .prob-bar { height: 16px; border-radius: 999px; background: #e9ecef; overflow: hidden; }
  .prob-fill { height: 100%; transition: width .5s ease; }
  .note { color: var(--muted); font-size: .85rem; margin-top: .5rem; }
  .msg { padding: .8rem 1rem; border-radius: 10px; }
  .msg.success { background: rgba(43,168,74,.12); color: var(--green); }
  .msg.error { background: rgba(231,76,60,.12); color: var(--red); }
  .msg.info { background: rgba(91,141,239,.12); color: var(--primary); }
  table { width: 100%; border-collapse: collapse; font-size: .85rem; }
  th, td { padding: .4rem .6rem; text-align: left; border-bottom: 1px solid var(--border); }
  #result { display: none; gap: 1.25rem; }
  #fatal { display: none; }
</style>
</head>
<body>
<main>
  <div>
    <h1>🏏 IPL Win Probability Prediction</h1>
    <div class="subtitle">Estimate the chasing team's win chance. Add the current match context and get instant probabilities.</div>
  </div>

  <div id="fatal" class="msg error"></div>

  <form id="form" class="card row">
    <div class="row three">
      <div><label for="batting_team">Batting Team</label><select id="batting_team"></select></div>
      <div><label for="bowling_team">Bowling Team</label><select id="bowling_team"></select></div>
      <div><label for="city">City</label><select id="city"></select></div>
    </div>
    <div class="row four">
      <div><label for="target">Target Score</label><input id="target" type="number" min="0" max="500" step="1"></div>
      <div><label for="score">Current Score</label><input id="score" type="number" min="0" max="500" step="1"></div>
      <div><label for="overs_completed">Overs Completed (0–20)</label><input id="overs_completed" type="number" min="0" max="20" step="1"></div>
      <div><label for="wickets_fallen">Wickets Fallen (0–10)</label><input id="wickets_fallen" type="number" min="0" max="10" step="1"></div>
    </div>
    <button type="submit">🔮 Predict Probability</button>
  </form>

  <div id="errors" class="row"></div>

  <div id="result" class="row">
    <div class="row four">
      <div class="card"><div class="kpi-title">Runs required</div><div class="kpi-value" id="k-runs"></div></div>
      <div class="card"><div class="kpi-title">Balls left</div><div class="kpi-value" id="k-balls"></div></div>
      <div class="card"><div class="kpi-title">Wickets in hand</div><div class="kpi-value" id="k-wkts"></div></div>
      <div class="card"><div class="kpi-title">CRR / RRR</div><div class="kpi-value"><span id="k-crr"></span><span class="pill">CRR</span> &nbsp; <span id="k-rrr"></span><span class="pill">RRR</span></div></div>
    </div>
    <div class="row two">
      <div>
        <div class="prob-label" id="bat-label"></div>
        <div class="prob-bar"><div class="prob-fill" id="bat-fill" style="background:var(--green)"></div></div>
        <div class="note" id="bat-pct"></div>
      </div>
      <div>
        <div class="prob-label" id="bowl-label"></div>
        <div class="prob-bar"><div class="prob-fill" id="bowl-fill" style="background:var(--red)"></div></div>
        <div class="note" id="bowl-pct"></div>
      </div>
    </div>
    <div id="verdict" class="msg"></div>
    <details class="card">
      <summary>See model inputs (debug)</summary>
      <div id="debug" class="note"></div>
    </details>
  </div>

  <div class="note">Disclaimer: This tool provides probabilistic estimates for educational purposes. Actual outcomes may vary.</div>
</main>

<script>
const $ = id => document.getElementById(id);
const fields = ['target', 'score', 'overs_completed', 'wickets_fallen'];

function fillSelect(id, values, selected) {
  $(id).replaceChildren(...values.map(v => new Option(v, v, false, v === selected)));
}

async function loadOptions() {
  const res = await fetch('/api/options');
  if (!res.ok) {
    const body = await res.json().catch(() => ({}));
    $('fatal').style.display = 'block';
    $('fatal').textContent = body.error || 'Could not load required artifacts.';
    $('form').style.display = 'none';
    return;
  }
  const { teams, cities, defaults } = await res.json();
  fillSelect('batting_team', teams, defaults.batting_team);
  fillSelect('bowling_team', teams, defaults.bowling_team);
  fillSelect('city', cities, defaults.city);
  fields.forEach(f => $(f).value = defaults[f]);
}

function el(tag, text, className) {
  const node = document.createElement(tag);
  node.textContent = text;
  if (className) node.className = className;
  return node;
}

function showErrors(list) {
  $('errors').replaceChildren(...list.map(e => el('div', e, 'msg error')));
}

function showReport(r) {
  $('k-runs').textContent = r.kpis.runs_required;
  $('k-balls').textContent = r.kpis.balls_left;
  $('k-wkts').textContent = r.kpis.wickets_in_hand;
  $('k-crr').textContent = r.kpis.crr;
  $('k-rrr').textContent = r.kpis.rrr;
  $('bat-label').textContent = `${r.batting.team} Win Probability`;
  $('bowl-label').textContent = `${r.bowling.team} Win Probability`;
  $('bat-fill').style.width = `${r.batting.percent}%`;
  $('bowl-fill').style.width = `${r.bowling.percent}%`;
  $('bat-pct').textContent = `${r.batting.percent}%`;
  $('bowl-pct').textContent = `${r.bowling.percent}%`;
  $('verdict').className = `msg ${r.verdict.tone}`;
  $('verdict').textContent = r.verdict.message;
  if (r.model_input) {
    const cols = Object.keys(r.model_input);
    const head = document.createElement('tr');
    const row = document.createElement('tr');
    head.append(...cols.map(c => el('th', c)));
    row.append(...cols.map(c => el('td', String(r.model_input[c]))));
    const table = document.createElement('table');
    table.append(head, row);
    $('debug').replaceChildren(table);
  } else {
    $('debug').textContent = 'Match already decided; the model was not consulted.';
  }
  $('result').style.display = 'grid';
}

$('form').addEventListener('submit', async ev => {
  ev.preventDefault();
  const body = {
    batting_team: $('batting_team').value,
    bowling_team: $('bowling_team').value,
    city: $('city').value,
  };
  fields.forEach(f => body[f] = parseInt($(f).value, 10));
  $('result').style.display = 'none';
  showErrors([]);
  const res = await fetch('/api/predict', {
    method: 'POST',
    headers: { 'content-type': 'application/json' },
    body: JSON.stringify(body),
  });
  const data = await res.json().catch(() => ({ error: `HTTP ${res.status}` }));
  if (res.ok) showReport(data);
  else showErrors(data.errors || [data.error]);
});

loadOptions();
</script>
</body>
</html>
"#;
