use super::SearchReport;
use crate::render::{escape_html, render_results_list, render_stats};

fn json_for_script_tag(value: &str) -> String {
    value.replace("</", "<\\/")
}

pub fn render_html(report: &SearchReport) -> Vec<u8> {
    let json = serde_json::to_string(&report.results).unwrap_or_else(|_| "[]".to_string());
    let json = json_for_script_tag(&json);
    let stats = render_stats(&report.stats);
    let table = render_results_list(&report.results);
    let query = escape_html(&report.query);
    let generated_at = escape_html(&report.generated_at);

    let html = format!(
        r####"<!DOCTYPE html>
<html lang="en">
<head>
  <meta charset="utf-8"/>
  <meta content="width=device-width, initial-scale=1.0" name="viewport"/>
  <title>bizsearch report: {query}</title>
  <script src="https://cdn.tailwindcss.com?plugins=forms,container-queries"></script>
  <link href="https://cdnjs.cloudflare.com/ajax/libs/font-awesome/6.4.0/css/all.min.css" rel="stylesheet"/>
  <link href="https://fonts.googleapis.com/css2?family=Montserrat:wght@700;800&amp;family=Inter:wght@400;500;600;700&amp;display=swap" rel="stylesheet"/>
  <script id="tailwind-config">
    tailwind.config = {{
      darkMode: "class",
      theme: {{
        extend: {{
          colors: {{
            "primary": "#4CAF50",
            "background-light": "#f8fafc",
            "background-dark": "#0f172a"
          }},
          fontFamily: {{
            "sans": ["Inter", "sans-serif"],
            "display": ["Montserrat", "sans-serif"]
          }}
        }}
      }}
    }};
  </script>
  <style type="text/tailwindcss">
    body {{
      font-family: 'Inter', sans-serif;
    }}
    h1, h2, h3 {{
      font-family: 'Montserrat', sans-serif;
      font-weight: 800;
      letter-spacing: -0.025em;
    }}
    .results-table {{ @apply w-full text-left border-collapse text-sm; }}
    .results-table th {{ @apply px-4 py-4 text-[11px] uppercase tracking-widest bg-slate-50 dark:bg-slate-800/50 border-b border-slate-200 dark:border-slate-800; }}
    .results-table td {{ @apply px-4 py-3 align-top border-b border-slate-100 dark:border-slate-800; }}
    .contact-item {{ @apply flex items-center gap-2; }}
    .social-links a {{ @apply mr-2 text-primary; }}
    .btn-small {{ @apply inline-block rounded-lg bg-primary px-3 py-1 text-xs font-bold text-white; }}
    .empty-results {{ @apply p-10 text-center text-slate-500; }}
  </style>
</head>
<body class="bg-background-light dark:bg-background-dark text-slate-900 dark:text-slate-100 min-h-screen transition-colors duration-200">
  <script type="application/json" id="results-data">{json}</script>
  <div class="layout-container flex h-full grow flex-col">
    <header class="flex items-center justify-between border-b border-slate-200 dark:border-slate-800 bg-white dark:bg-slate-900 px-8 py-4 sticky top-0 z-50">
      <div class="flex items-center gap-4">
        <div class="size-10 bg-primary rounded-xl flex items-center justify-center text-white shadow-lg shadow-primary/20">
          <i class="fas fa-building"></i>
        </div>
        <h2 class="text-slate-900 dark:text-white text-xl font-display uppercase tracking-tight">bizsearch Report</h2>
      </div>
      <button id="theme-toggle" class="flex size-10 cursor-pointer items-center justify-center rounded-xl bg-slate-100 dark:bg-slate-800 text-slate-600 dark:text-white" type="button">
        <i id="theme-icon" class="fas fa-sun"></i>
      </button>
    </header>

    <main class="flex-1 max-w-[1440px] mx-auto w-full px-8 py-10">
      <div class="mb-10">
        <h1 class="text-slate-900 dark:text-white text-5xl mb-2">{query}</h1>
        <p class="text-slate-500 dark:text-slate-400 text-base font-medium">Generated {generated_at}</p>
      </div>

      <section id="results-stats" class="mb-8">
{stats}      </section>

      <div class="bg-white dark:bg-slate-900 rounded-2xl border border-slate-200 dark:border-slate-800 p-5 mb-8 shadow-sm">
        <div class="flex items-center gap-3 bg-slate-50 dark:bg-slate-800/50 rounded-xl px-4 py-3 border border-slate-200 dark:border-slate-700">
          <i class="fas fa-search text-slate-400"></i>
          <input id="search" class="bg-transparent border-none focus:ring-0 text-sm w-full" placeholder="Filter companies, addresses, contacts..." type="text"/>
        </div>
      </div>

      <section id="results-list" class="bg-white dark:bg-slate-900 border border-slate-200 dark:border-slate-800 rounded-2xl overflow-x-auto shadow-sm">
{table}      </section>
    </main>

    <footer class="mt-auto py-8 border-t border-slate-200 dark:border-slate-800 text-center">
      <p class="text-xs font-bold text-slate-400 dark:text-slate-500 uppercase tracking-widest">BIZSEARCH REPORT</p>
    </footer>
  </div>

  <script>
    (function() {{
      const root = document.documentElement;
      const icon = document.getElementById('theme-icon');
      function applyTheme(dark) {{
        root.classList.toggle('dark', dark);
        icon.className = dark ? 'fas fa-moon' : 'fas fa-sun';
      }}
      applyTheme(localStorage.getItem('bizsearch-theme') === 'dark');
      document.getElementById('theme-toggle').addEventListener('click', function() {{
        const dark = !root.classList.contains('dark');
        localStorage.setItem('bizsearch-theme', dark ? 'dark' : 'light');
        applyTheme(dark);
      }});

      const rows = Array.from(document.querySelectorAll('.result-row'));
      document.getElementById('search').addEventListener('input', function(e) {{
        const needle = e.target.value.trim().toLowerCase();
        for (const row of rows) {{
          row.style.display = !needle || row.textContent.toLowerCase().includes(needle) ? '' : 'none';
        }}
      }});
    }})();
  </script>
</body>
</html>
"####
    );
    html.into_bytes()
}
