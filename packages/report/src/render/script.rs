//! The single inline script block: chart descriptors, the watermark plugin,
//! and the page behaviours (sources banner, share modal, feedback form).

use serde_json::{json, Map, Value};

use super::escape::script_json;
use super::theme::{BRAND_NAME, CHART_SERIES, WATERMARK_PLUGIN_ID};
use crate::types::chart::ChartDescriptor;

/// One chart to draw: the canvas element id and its chart-library config.
#[derive(Debug, Clone, PartialEq)]
pub struct ChartEntry {
    pub canvas_id: String,
    pub config: Value,
}

impl ChartEntry {
    pub fn new(canvas_id: impl Into<String>, chart: &ChartDescriptor) -> Self {
        Self {
            canvas_id: canvas_id.into(),
            config: chart_config(chart),
        }
    }
}

/// Chart-library config for a descriptor.
///
/// Record options are merged over the defaults; watermark settings are
/// dropped so a record can never switch the watermark off.
pub fn chart_config(chart: &ChartDescriptor) -> Value {
    let per_point = chart.chart_type.colors_per_point();

    let datasets: Vec<Value> = chart
        .datasets
        .iter()
        .enumerate()
        .map(|(i, dataset)| {
            let colors = if !dataset.colors.is_empty() {
                json!(dataset.colors)
            } else if per_point {
                json!((0..chart.labels.len())
                    .map(|j| CHART_SERIES[j % CHART_SERIES.len()])
                    .collect::<Vec<_>>())
            } else {
                json!(CHART_SERIES[i % CHART_SERIES.len()])
            };
            json!({
                "label": dataset.label,
                "data": dataset.data,
                "backgroundColor": colors,
                "borderColor": colors,
                "borderWidth": 1,
            })
        })
        .collect();

    let mut options = json!({
        "responsive": true,
        "maintainAspectRatio": false,
        "plugins": {
            "title": { "display": true, "text": chart.title },
            "legend": { "display": per_point || chart.datasets.len() > 1 },
        },
    });
    if let Some(extra) = &chart.options {
        merge(&mut options, extra);
    }
    // `plugins: false` would switch every plugin off, watermark included.
    if !options.is_object() {
        options = json!({});
    }
    if !options["plugins"].is_object() {
        options["plugins"] = json!({});
    }
    if let Some(plugins) = options.get_mut("plugins").and_then(Value::as_object_mut) {
        plugins.remove(WATERMARK_PLUGIN_ID);
    }

    json!({
        "type": chart.chart_type.as_str(),
        "data": { "labels": chart.labels, "datasets": datasets },
        "options": options,
    })
}

/// Recursively merge `overlay` into `base`; non-object values replace.
fn merge(base: &mut Value, overlay: &Value) {
    match (base, overlay) {
        (Value::Object(base), Value::Object(overlay)) => {
            for (key, value) in overlay {
                match base.get_mut(key) {
                    Some(existing) => merge(existing, value),
                    None => {
                        base.insert(key.clone(), value.clone());
                    }
                }
            }
        }
        (base, overlay) => *base = overlay.clone(),
    }
}

const SCRIPT_TEMPLATE: &str = r#"
(function () {
  'use strict';
  var WATERMARK = __WATERMARK__;
  var CHARTS = __CHARTS__;

  if (window.Chart) {
    Chart.register({
      id: WATERMARK.id,
      afterDraw: function (chart) {
        var ctx = chart.ctx;
        ctx.save();
        ctx.font = WATERMARK.font;
        ctx.fillStyle = WATERMARK.color;
        ctx.textAlign = 'right';
        ctx.textBaseline = 'bottom';
        ctx.fillText(WATERMARK.text, chart.width - 8, chart.height - 6);
        ctx.restore();
      }
    });
    CHARTS.forEach(function (entry) {
      var canvas = document.getElementById(entry.canvas);
      if (canvas) { new Chart(canvas, entry.config); }
    });
  }

  var banner = document.getElementById('sources-banner');
  if (banner) {
    var toggle = banner.querySelector('button');
    toggle.addEventListener('click', function () {
      var collapsed = banner.classList.toggle('collapsed');
      toggle.setAttribute('aria-expanded', collapsed ? 'false' : 'true');
    });
  }

  var modal = document.getElementById('share-modal');
  var shareUrl = document.getElementById('share-url');
  function openShare() {
    shareUrl.value = window.location.href;
    var text = encodeURIComponent(document.title);
    var link = encodeURIComponent(window.location.href);
    modal.querySelector('[data-share="x"]').href = 'https://x.com/intent/post?text=' + text + '&url=' + link;
    modal.querySelector('[data-share="email"]').href = 'mailto:?subject=' + text + '&body=' + link;
    modal.hidden = false;
  }
  document.querySelectorAll('[data-action="share"]').forEach(function (button) {
    button.addEventListener('click', openShare);
  });
  modal.addEventListener('click', function (event) {
    var action = event.target.getAttribute('data-share');
    if (event.target === modal || action === 'close') { modal.hidden = true; }
    if (action === 'copy' && navigator.clipboard) {
      navigator.clipboard.writeText(shareUrl.value);
      event.target.textContent = 'Copied';
    }
  });

  var form = document.querySelector('.feedback-form');
  if (form && window.fetch) {
    form.addEventListener('submit', function (event) {
      event.preventDefault();
      var status = form.querySelector('.feedback-status');
      fetch(form.action, { method: 'POST', body: new FormData(form) })
        .then(function (response) {
          status.textContent = response.ok ? 'Thank you. Our editors will review this.' : 'Sorry, that did not go through.';
          if (response.ok) { form.reset(); }
        })
        .catch(function () { status.textContent = 'Sorry, that did not go through.'; });
    });
  }
})();
"#;

/// Body of the page's one inline script block.
pub fn page_script(charts: &[ChartEntry]) -> String {
    let watermark = json!({
        "id": WATERMARK_PLUGIN_ID,
        "text": BRAND_NAME,
        "font": "600 13px Inter, sans-serif",
        "color": "rgba(15, 23, 42, 0.35)",
    });
    let charts = Value::Array(
        charts
            .iter()
            .map(|entry| {
                let mut item = Map::new();
                item.insert("canvas".to_string(), json!(entry.canvas_id));
                item.insert("config".to_string(), entry.config.clone());
                Value::Object(item)
            })
            .collect(),
    );

    SCRIPT_TEMPLATE
        .replace("__WATERMARK__", &script_json(&watermark))
        .replace("__CHARTS__", &script_json(&charts))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::chart::{ChartType, Dataset};

    fn chart(options: Option<Value>) -> ChartDescriptor {
        ChartDescriptor {
            chart_type: ChartType::Bar,
            title: "Cases".to_string(),
            labels: vec!["a".into(), "b".into()],
            datasets: vec![Dataset {
                label: "n".to_string(),
                data: vec![1.0, 2.0],
                colors: vec![],
            }],
            options,
        }
    }

    #[test]
    fn record_cannot_disable_watermark() {
        let options = json!({ "plugins": { "factdeskWatermark": false, "legend": { "position": "bottom" } } });
        let config = chart_config(&chart(Some(options)));
        let plugins = &config["options"]["plugins"];
        assert!(plugins.get(WATERMARK_PLUGIN_ID).is_none());
        assert_eq!(plugins["legend"]["position"], "bottom");
        assert_eq!(plugins["title"]["text"], "Cases");
    }

    #[test]
    fn single_series_uses_brand_accent() {
        let config = chart_config(&chart(None));
        assert_eq!(
            config["data"]["datasets"][0]["backgroundColor"],
            CHART_SERIES[0]
        );
    }

    #[test]
    fn pie_charts_colour_each_slice() {
        let mut descriptor = chart(None);
        descriptor.chart_type = ChartType::Pie;
        let config = chart_config(&descriptor);
        let colors = config["data"]["datasets"][0]["backgroundColor"]
            .as_array()
            .unwrap();
        assert_eq!(colors.len(), 2);
    }

    #[test]
    fn registers_watermark_once() {
        let entries = vec![
            ChartEntry::new("chart-1", &chart(None)),
            ChartEntry::new("chart-2", &chart(None)),
        ];
        let script = page_script(&entries);
        assert_eq!(script.matches("Chart.register(").count(), 1);
        assert!(script.contains("\"canvas\":\"chart-2\""));
    }
}
