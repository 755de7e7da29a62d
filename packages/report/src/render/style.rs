//! The single stylesheet block emitted into every report.
//!
//! Colour values mirror `theme::palette`. Floats collapse to full width below
//! 768px.

pub const STYLESHEET: &str = r#"
:root {
  --ink: #0f172a;
  --paper: #f8fafc;
  --accent: #0e7490;
  --accent-dark: #155e75;
  --muted: #64748b;
  --rule: #e2e8f0;
  --tier-1: #15803d;
  --tier-2: #b45309;
  --tier-3: #b91c1c;
  --serif: "Source Serif 4", Georgia, serif;
  --sans: Inter, system-ui, -apple-system, "Segoe UI", sans-serif;
}
* { box-sizing: border-box; }
html { scroll-behavior: smooth; }
body { margin: 0; background: var(--paper); color: var(--ink); font-family: var(--serif); line-height: 1.65; }
a { color: var(--accent); }
a:hover { color: var(--accent-dark); }
.watermark-bg { position: fixed; right: -2rem; bottom: 2rem; font-family: var(--sans); font-weight: 700; font-size: 9rem; color: var(--ink); opacity: 0.03; transform: rotate(-12deg); pointer-events: none; user-select: none; z-index: 0; }
.navbar { position: sticky; top: 0; z-index: 20; display: flex; align-items: center; justify-content: space-between; padding: 0.75rem 1.5rem; background: var(--ink); color: #ffffff; font-family: var(--sans); }
.navbar .wordmark { color: #ffffff; font-weight: 700; font-size: 1.25rem; letter-spacing: 0.02em; text-decoration: none; }
.navbar nav a { color: #cbd5e1; margin-left: 1.25rem; text-decoration: none; font-size: 0.95rem; }
.navbar nav a:hover { color: #ffffff; }
.share-button { margin-left: 1.25rem; background: var(--accent); color: #ffffff; border: 0; border-radius: 4px; padding: 0.4rem 0.9rem; font-family: var(--sans); cursor: pointer; }
.mobile-notice { display: none; padding: 0.6rem 1rem; background: #fef3c7; color: #78350f; font-family: var(--sans); font-size: 0.85rem; text-align: center; }
.sources-banner { position: sticky; top: 3.25rem; z-index: 10; background: #ffffff; border-bottom: 1px solid var(--rule); font-family: var(--sans); font-size: 0.9rem; }
.sources-banner button { width: 100%; padding: 0.6rem 1.5rem; background: none; border: 0; text-align: left; font-weight: 600; cursor: pointer; color: var(--ink); }
.sources-banner ol { margin: 0; padding: 0 1.5rem 0.8rem 3rem; }
.sources-banner.collapsed ol { display: none; }
.report { position: relative; z-index: 1; max-width: 860px; margin: 0 auto; padding: 2rem 1.5rem 4rem; }
.report-header { border-bottom: 2px solid var(--ink); padding-bottom: 1.5rem; margin-bottom: 2rem; }
.tag { display: inline-block; padding: 0.2rem 0.6rem; border-radius: 3px; color: #ffffff; font-family: var(--sans); font-size: 0.75rem; font-weight: 600; text-transform: uppercase; letter-spacing: 0.05em; }
.report-header h1 { font-size: 2.4rem; line-height: 1.2; margin: 0.8rem 0 0.4rem; }
.subtitle { font-size: 1.2rem; color: var(--muted); margin: 0; }
.meta { font-family: var(--sans); color: var(--muted); font-size: 0.85rem; margin-top: 1rem; }
.verdict-badge { display: flex; gap: 1rem; align-items: center; margin-top: 1.25rem; padding: 1rem 1.25rem; border-left: 6px solid var(--verdict); background: #ffffff; }
.verdict-badge .verdict-label { font-family: var(--sans); font-weight: 700; font-size: 1.1rem; color: var(--verdict); text-transform: uppercase; white-space: nowrap; }
.verdict-badge .confidence { font-family: var(--sans); font-size: 0.8rem; color: var(--muted); }
.executive-summary { background: #ffffff; border: 1px solid var(--rule); border-radius: 6px; padding: 1.5rem; margin-bottom: 2.5rem; }
.executive-summary h2 { margin-top: 0; font-family: var(--sans); font-size: 1rem; text-transform: uppercase; letter-spacing: 0.08em; color: var(--accent); }
.summary-claim, .summary-reality { margin: 0 0 1rem; }
.summary-claim strong, .summary-reality strong { font-family: var(--sans); }
.key-points { margin: 0; padding-left: 1.25rem; }
.key-points li { margin-bottom: 0.4rem; }
.content-section { margin-bottom: 2.5rem; overflow: hidden; }
.content-section h2 { font-size: 1.6rem; margin-bottom: 0.75rem; }
.chart-figure { margin: 0 0 1rem; background: #ffffff; border: 1px solid var(--rule); border-radius: 6px; padding: 0.75rem; }
.chart-figure .chart-canvas { position: relative; height: 280px; }
.chart-float.chart-left { float: left; width: 45%; margin-right: 1.5rem; }
.chart-float.chart-right { float: right; width: 45%; margin-left: 1.5rem; }
.chart-block { width: 100%; }
.chart-figure figcaption { font-family: var(--sans); font-size: 0.8rem; color: var(--muted); margin-top: 0.5rem; }
sup.cite a { text-decoration: none; font-family: var(--sans); font-size: 0.7rem; }
.quote-box { clear: both; margin: 1.5rem 0; padding: 1rem 1.5rem; border-left: 4px solid var(--accent); background: #ecfeff; font-style: italic; }
.quote-box footer { font-style: normal; font-family: var(--sans); font-size: 0.85rem; color: var(--muted); margin-top: 0.5rem; }
.timeline { clear: both; list-style: none; margin: 1.5rem 0; padding: 0 0 0 1.25rem; border-left: 2px solid var(--rule); }
.timeline li { position: relative; margin-bottom: 1rem; }
.timeline li::before { content: ""; position: absolute; left: -1.65rem; top: 0.45rem; width: 0.7rem; height: 0.7rem; border-radius: 50%; background: var(--accent); }
.timeline .timeline-date { font-family: var(--sans); font-weight: 600; font-size: 0.85rem; color: var(--accent); }
.bottom-line { clear: both; background: var(--ink); color: #ffffff; border-radius: 6px; padding: 1.5rem; margin-bottom: 2.5rem; }
.bottom-line h2 { margin-top: 0; font-family: var(--sans); font-size: 1rem; text-transform: uppercase; letter-spacing: 0.08em; color: #67e8f9; }
.sources-grid .grid { display: grid; grid-template-columns: repeat(auto-fill, minmax(240px, 1fr)); gap: 1rem; }
.source-card { background: #ffffff; border: 1px solid var(--rule); border-radius: 6px; padding: 1rem; font-family: var(--sans); font-size: 0.9rem; }
.source-card .source-name { font-weight: 600; }
.source-card .source-domain { color: var(--muted); font-size: 0.8rem; }
.source-card blockquote { margin: 0.5rem 0 0; font-family: var(--serif); font-style: italic; }
.trust-badge { display: inline-block; padding: 0.1rem 0.45rem; border-radius: 3px; color: #ffffff; font-size: 0.75rem; font-weight: 700; }
.trust-tier-1 { background: var(--tier-1); }
.trust-tier-2 { background: var(--tier-2); }
.trust-tier-3 { background: var(--tier-3); }
.claims-table { width: 100%; border-collapse: collapse; font-family: var(--sans); font-size: 0.9rem; margin-bottom: 2.5rem; }
.claims-table th, .claims-table td { border-bottom: 1px solid var(--rule); padding: 0.5rem; text-align: left; vertical-align: top; }
.feedback { border-top: 1px solid var(--rule); padding-top: 1.5rem; font-family: var(--sans); }
.feedback textarea { width: 100%; min-height: 6rem; font: inherit; padding: 0.5rem; }
.feedback button { margin-top: 0.5rem; background: var(--accent); color: #ffffff; border: 0; border-radius: 4px; padding: 0.5rem 1rem; cursor: pointer; }
.site-footer { background: var(--ink); color: #cbd5e1; font-family: var(--sans); font-size: 0.85rem; padding: 2rem 1.5rem; text-align: center; }
.site-footer .wordmark { color: #ffffff; font-weight: 700; font-size: 1.1rem; }
.share-modal { position: fixed; inset: 0; z-index: 50; display: flex; align-items: center; justify-content: center; background: rgba(15, 23, 42, 0.6); }
.share-modal[hidden] { display: none; }
.share-modal .dialog { background: #ffffff; border-radius: 8px; padding: 1.5rem; width: min(420px, 90vw); font-family: var(--sans); }
.share-modal input { width: 100%; padding: 0.4rem; font: inherit; }
@media (max-width: 768px) {
  .mobile-notice { display: block; }
  .navbar nav a { display: none; }
  .report-header h1 { font-size: 1.8rem; }
  .chart-float.chart-left, .chart-float.chart-right { float: none; width: 100%; margin: 0 0 1rem; }
  .sources-banner { top: 3rem; }
}
@media print {
  .navbar, .sources-banner, .share-modal, .feedback, .mobile-notice { display: none; }
}
"#;
